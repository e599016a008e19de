use std::path::Path;

use log::{error, info};

use crate::RepCounterError;

use super::{LandmarkFrame, LandmarkOutput, SessionInfo};

/// Source of pose landmark records.
///
/// Implementations wrap a pose estimator (live camera, recorded file) and hand out
/// [`LandmarkOutput`] records in the order they were produced.
///
/// # Lifecycle
///
/// 1. Call `start()` to open the underlying source
/// 2. Call `next_record()` until it returns `Ok(None)`
/// 3. `session_info()` reports the session of the most recent records
pub trait LandmarkProducer {
    /// Open the landmark source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be opened.
    fn start(&mut self) -> Result<(), RepCounterError>;

    /// Information about the session currently being produced.
    fn session_info(&mut self) -> Result<SessionInfo, RepCounterError>;

    /// The next record, or `None` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the producer was not started or the source failed.
    fn next_record(&mut self) -> Result<Option<LandmarkOutput>, RepCounterError>;
}

/// Replays landmark records that were recorded earlier or built in memory.
///
/// Used for offline analysis of recorded sessions and to drive the counter in tests
/// without a camera or pose estimator.
pub struct RecordedLandmarkProducer {
    cur_record: usize,
    records: Vec<LandmarkOutput>,
    session: SessionInfo,
    started: bool,
}

impl RecordedLandmarkProducer {
    /// Create a producer that replays the given frames as a single session.
    pub fn from_frames(frames: Vec<LandmarkFrame>) -> Self {
        Self::from_records(
            frames
                .into_iter()
                .map(|frame| LandmarkOutput::Frame(Box::new(frame)))
                .collect(),
        )
    }

    pub fn from_records(records: Vec<LandmarkOutput>) -> Self {
        Self {
            cur_record: 0,
            records,
            session: SessionInfo::default(),
            started: false,
        }
    }

    /// Load landmark records from a JSON Lines file containing [`LandmarkOutput`] objects.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or a line is not a valid record.
    pub fn from_file(file: &Path) -> Result<Self, RepCounterError> {
        let records = serde_jsonlines::json_lines(file)
            .map_err(|e| RepCounterError::LandmarkFileError { source: e })?
            .collect::<Result<Vec<LandmarkOutput>, std::io::Error>>()
            .map_err(|e| {
                error!("Could not parse landmark record in {:?}: {}", file, e);
                RepCounterError::LandmarkProducerError {
                    description: format!("Could not parse landmark record: {}", e),
                }
            })?;
        info!("Loaded {} landmark records from {:?}", records.len(), file);
        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LandmarkProducer for RecordedLandmarkProducer {
    fn start(&mut self) -> Result<(), RepCounterError> {
        self.started = true;
        Ok(())
    }

    fn session_info(&mut self) -> Result<SessionInfo, RepCounterError> {
        Ok(self.session.clone())
    }

    fn next_record(&mut self) -> Result<Option<LandmarkOutput>, RepCounterError> {
        if !self.started {
            return Err(RepCounterError::LandmarkProducerError {
                description: "Producer not started".to_string(),
            });
        }
        let Some(record) = self.records.get(self.cur_record).cloned() else {
            return Ok(None);
        };
        self.cur_record += 1;

        if let LandmarkOutput::SessionStart(ref session) = record {
            self.session = session.clone();
        }
        Ok(Some(record))
    }
}
