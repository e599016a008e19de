use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{info, warn};
use repcounter::{
    AppConfig, Arm, FrameProcessor, Point2D, RepCounterError, compute_angle,
    pose::{
        RepEvent, RepOutput, producer::RecordedLandmarkProducer, spawn_replay,
        summary::RepSummary,
    },
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count push-ups in a recorded landmark stream
    Replay {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Arm to measure, overrides the config file
        #[arg(short, long)]
        arm: Option<Arm>,
    },
    /// Print the angle at the vertex of three points
    Angle {
        #[arg(
            num_args = 6,
            required = true,
            allow_negative_numbers = true,
            value_names = ["PROXIMAL_X", "PROXIMAL_Y", "VERTEX_X", "VERTEX_Y", "DISTAL_X", "DISTAL_Y"]
        )]
        coords: Vec<f64>,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config directory
        #[arg(long)]
        save: bool,
    },
}

fn load_config() -> AppConfig {
    match AppConfig::from_local_file() {
        Ok(Some(config)) => config,
        Ok(None) => AppConfig::default(),
        Err(e) => {
            warn!("Ignoring config file: {}", e);
            AppConfig::default()
        }
    }
}

fn replay(input: &Path, output: Option<PathBuf>, arm: Option<Arm>) -> Result<(), RepCounterError> {
    if !input.exists() {
        return Err(RepCounterError::InvalidLandmarkFile {
            path: format!("{:?}", input),
        });
    }

    let mut config = load_config();
    if let Some(arm) = arm {
        config.arm = arm;
    }
    let processor = FrameProcessor::from_config(&config)?;
    let producer = RecordedLandmarkProducer::from_file(input)?;
    info!(
        "Replaying {} records measuring the {} arm",
        producer.len(),
        config.arm
    );

    let (rep_rx, replay_handle) = spawn_replay(producer, processor, output);

    let mut events: Vec<RepEvent> = Vec::new();
    for output in rep_rx {
        match output {
            RepOutput::SessionStart(session) => {
                if !events.is_empty() {
                    print_summary(&RepSummary::from_events(&events));
                    events.clear();
                }
                println!("Session: {} ({})", session.subject, session.exercise);
            }
            RepOutput::Rep(event) => {
                if event.new_rep {
                    println!("Push-Ups: {}", event.state.count);
                }
                events.push(event);
            }
        }
    }

    let final_state = replay_handle.join()?;

    print_summary(&RepSummary::from_events(&events));
    info!("Replay finished with {} reps", final_state.count);
    Ok(())
}

fn print_summary(summary: &RepSummary) {
    println!("Total push-ups: {}", summary.total_reps);
    println!(
        "Frames: {} ({} without a usable arm)",
        summary.frames, summary.unavailable_frames
    );
    if let (Some(min), Some(max)) = (summary.min_angle, summary.max_angle) {
        println!("Elbow angle range: {:.1}° - {:.1}°", min, max);
    }
}

fn angle(coords: &[f64]) -> Result<(), RepCounterError> {
    let [px, py, vx, vy, dx, dy] = coords else {
        return Err(RepCounterError::InvalidInput {
            reason: format!("expected 6 coordinates, got {}", coords.len()),
        });
    };
    let degrees = compute_angle(
        Point2D::new(*px, *py),
        Point2D::new(*vx, *vy),
        Point2D::new(*dx, *dy),
    )?;
    println!("{:.2}", degrees);
    Ok(())
}

fn config(save: bool) -> Result<(), RepCounterError> {
    let config = load_config();
    println!(
        "{}",
        serde_json::to_string_pretty(&config)
            .map_err(|e| RepCounterError::ConfigSerializeError { source: e })?
    );
    if save {
        config.save()?;
        info!("Saved config to {:?}", AppConfig::config_path()?);
    }
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    let result = match &cli.command {
        Commands::Replay { input, output, arm } => replay(input, output.clone(), *arm),
        Commands::Angle { coords } => angle(coords),
        Commands::Config { save } => config(*save),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
