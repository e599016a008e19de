// Error types for repcounter

use crate::pose::RepOutput;
use snafu::Snafu;
use std::{io, sync::mpsc::SendError};

#[derive(Debug, Snafu)]
pub enum RepCounterError {
    // Joint angle geometry errors
    #[snafu(display("Invalid joint coordinates: {reason}"))]
    InvalidInput { reason: String },
    #[snafu(display("Joint vertex coincides with one of its endpoints, angle is undefined"))]
    DegenerateGeometry,

    // Counter configuration errors
    #[snafu(display(
        "Invalid rep thresholds: flexed ({flexed}) must be finite and below extended ({extended})"
    ))]
    InvalidThresholds { extended: f64, flexed: f64 },

    // Errors while reading and broadcasting landmark data
    #[snafu(display("Unable to open landmark file"))]
    LandmarkFileError { source: io::Error },
    #[snafu(display("Landmark producer error: {description}"))]
    LandmarkProducerError { description: String },
    #[snafu(display("Invalid landmark file: {path}"))]
    InvalidLandmarkFile { path: String },
    #[snafu(display("Error broadcasting rep update"))]
    RepBroadcastError { source: Box<SendError<RepOutput>> },

    // Errors for the rep writer
    #[snafu(display("Error writing rep file"))]
    WriterError { source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error accessing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Session errors
    #[snafu(display("Unknown exercise session: {session_id}"))]
    UnknownSession { session_id: String },
}

impl From<SendError<RepOutput>> for RepCounterError {
    fn from(value: SendError<RepOutput>) -> Self {
        RepCounterError::RepBroadcastError {
            source: Box::new(value),
        }
    }
}
