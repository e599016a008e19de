use std::{
    path::PathBuf,
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use log::{debug, error, info};

use crate::{RepCounterError, session::FrameProcessor, writer};

use super::{LandmarkOutput, RepCounterState, RepOutput, producer::LandmarkProducer};

/// Drive `processor` with every record of `producer` until it is exhausted.
///
/// Each frame produces a [`RepOutput::Rep`] sent to `rep_sender` and, when given, to
/// `rep_writer_sender`. A session start resets the processor so counts never leak
/// between sessions. Returns the state of the last session.
pub fn collect_reps(
    mut producer: impl LandmarkProducer,
    mut processor: FrameProcessor,
    rep_sender: Sender<RepOutput>,
    rep_writer_sender: Option<Sender<RepOutput>>,
) -> Result<RepCounterState, RepCounterError> {
    producer.start()?;

    while let Some(record) = producer.next_record()? {
        let output = match record {
            LandmarkOutput::SessionStart(session) => {
                info!(
                    "Starting {} session for {}",
                    session.exercise, session.subject
                );
                processor.reset();
                RepOutput::SessionStart(session)
            }
            LandmarkOutput::Frame(frame) => {
                let event = processor.process(&frame);
                if event.new_rep {
                    info!(
                        "Rep {} completed at frame {}",
                        event.state.count, event.frame_no
                    );
                } else {
                    debug!(
                        "Frame {}: angle {:?}, phase {:?}",
                        event.frame_no, event.angle, event.state.phase
                    );
                }
                RepOutput::Rep(event)
            }
        };

        broadcast(&rep_sender, output.clone())?;
        if let Some(ref writer_sender) = rep_writer_sender {
            broadcast(writer_sender, output)?;
        }
    }

    let final_state = processor.snapshot();
    info!("Landmark stream exhausted with {} reps", final_state.count);
    Ok(final_state)
}

fn broadcast(sender: &Sender<RepOutput>, output: RepOutput) -> Result<(), RepCounterError> {
    sender.send(output).map_err(|e| {
        error!("Could not send rep update: {}", e);
        RepCounterError::from(e)
    })
}

/// Threads of a running replay, see [`spawn_replay`].
pub struct ReplayHandle {
    collector: JoinHandle<Result<RepCounterState, RepCounterError>>,
    writer: Option<JoinHandle<Result<(), RepCounterError>>>,
}

impl ReplayHandle {
    /// Wait for the collector and the writer. A writer failure is reported ahead of the
    /// broadcast error it causes in the collector.
    pub fn join(self) -> Result<RepCounterState, RepCounterError> {
        let collected = join_thread(self.collector, "Landmark collector");
        if let Some(writer) = self.writer {
            join_thread(writer, "Rep writer")?;
        }
        collected
    }
}

fn join_thread<T>(
    handle: JoinHandle<Result<T, RepCounterError>>,
    name: &str,
) -> Result<T, RepCounterError> {
    handle
        .join()
        .map_err(|_| RepCounterError::LandmarkProducerError {
            description: format!("{} thread panicked", name),
        })?
}

/// Run [`collect_reps`] on its own thread, writing every record to `output` on a writer
/// thread when given. The returned receiver yields the live rep stream.
pub fn spawn_replay<P>(
    producer: P,
    processor: FrameProcessor,
    output: Option<PathBuf>,
) -> (Receiver<RepOutput>, ReplayHandle)
where
    P: LandmarkProducer + Send + 'static,
{
    let (rep_tx, rep_rx) = mpsc::channel::<RepOutput>();

    // with an output file the collector sends to both the live and writer channels
    let (rep_writer_tx, writer) = match output {
        Some(output_file) => {
            let (tx, rx) = mpsc::channel::<RepOutput>();
            let handle = thread::spawn(move || writer::write_reps(&output_file, rx));
            (Some(tx), Some(handle))
        }
        None => (None, None),
    };
    let collector =
        thread::spawn(move || collect_reps(producer, processor, rep_tx, rep_writer_tx));

    (rep_rx, ReplayHandle { collector, writer })
}
