//! Per-session ownership of rep counters.
//!
//! Every exercising subject gets its own [`FrameProcessor`]; nothing is shared between
//! sessions, so concurrent clients can never observe or corrupt each other's counts.
//! Transport shells (web endpoints, desktop loops) hold a [`SessionRegistry`] and answer
//! with a [`RepResponse`].

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    RepCounterError,
    config::AppConfig,
    pose::{
        JointExtractor, LandmarkFrame, RepCounter, RepCounterState, RepEvent, RepThresholds,
        smoothing::AngleSmoother,
    },
};

/// The full per-frame pipeline: landmarks -> elbow angle -> optional smoothing -> counter.
pub struct FrameProcessor {
    extractor: JointExtractor,
    smoother: Option<AngleSmoother>,
    counter: RepCounter,
}

impl Default for FrameProcessor {
    fn default() -> Self {
        Self::new(JointExtractor::default(), RepThresholds::default(), false)
    }
}

impl FrameProcessor {
    pub fn new(extractor: JointExtractor, thresholds: RepThresholds, smoothing: bool) -> Self {
        Self {
            extractor,
            smoother: smoothing.then(AngleSmoother::new),
            counter: RepCounter::with_thresholds(thresholds),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, RepCounterError> {
        Ok(Self::new(
            config.extractor(),
            config.thresholds()?,
            config.smoothing,
        ))
    }

    pub fn process(&mut self, frame: &LandmarkFrame) -> RepEvent {
        let mut sample = self.extractor.sample(frame);
        if let Some(smoother) = self.smoother.as_mut() {
            sample = smoother.smooth(sample);
        }

        let prev_count = self.counter.snapshot().count;
        let state = self.counter.update(sample);
        RepEvent {
            frame_no: frame.frame_no,
            timestamp_ms: frame.timestamp_ms,
            angle: sample.degrees(),
            state,
            new_rep: state.count > prev_count,
        }
    }

    pub fn reset(&mut self) {
        self.counter.reset();
        if let Some(smoother) = self.smoother.as_mut() {
            smoother.reset();
        }
    }

    pub fn snapshot(&self) -> RepCounterState {
        self.counter.snapshot()
    }
}

/// Rep counters keyed by session id.
pub struct SessionRegistry {
    extractor: JointExtractor,
    thresholds: RepThresholds,
    smoothing: bool,
    sessions: HashMap<String, FrameProcessor>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self {
            extractor: JointExtractor::default(),
            thresholds: RepThresholds::default(),
            smoothing: false,
            sessions: HashMap::new(),
        }
    }
}

impl SessionRegistry {
    /// Registry whose new sessions are configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidThresholds` if the configured thresholds are unusable.
    pub fn new(config: &AppConfig) -> Result<Self, RepCounterError> {
        Ok(Self {
            extractor: config.extractor(),
            thresholds: config.thresholds()?,
            smoothing: config.smoothing,
            sessions: HashMap::new(),
        })
    }

    /// Feed a frame to the session's counter, creating the session on first use.
    pub fn process(&mut self, session_id: &str, frame: &LandmarkFrame) -> RepEvent {
        let processor = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                info!("Starting exercise session {}", session_id);
                FrameProcessor::new(self.extractor, self.thresholds, self.smoothing)
            });
        let event = processor.process(frame);
        if event.new_rep {
            debug!("Session {} reached {} reps", session_id, event.state.count);
        }
        event
    }

    pub fn snapshot(&self, session_id: &str) -> Result<RepCounterState, RepCounterError> {
        self.sessions
            .get(session_id)
            .map(FrameProcessor::snapshot)
            .ok_or_else(|| unknown_session(session_id))
    }

    /// Restart the count of an existing session.
    pub fn reset(&mut self, session_id: &str) -> Result<RepCounterState, RepCounterError> {
        let processor = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| unknown_session(session_id))?;
        processor.reset();
        Ok(processor.snapshot())
    }

    /// Discard a session, returning its final state.
    pub fn end(&mut self, session_id: &str) -> Result<RepCounterState, RepCounterError> {
        let processor = self
            .sessions
            .remove(session_id)
            .ok_or_else(|| unknown_session(session_id))?;
        let state = processor.snapshot();
        info!(
            "Ended exercise session {} with {} reps",
            session_id, state.count
        );
        Ok(state)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn unknown_session(session_id: &str) -> RepCounterError {
    RepCounterError::UnknownSession {
        session_id: session_id.to_string(),
    }
}

/// JSON envelope returned to clients: `{"count": n}` or `{"error": "..."}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepResponse {
    Count { count: u32 },
    Error { error: String },
}

impl RepResponse {
    pub fn from_result(result: Result<RepCounterState, RepCounterError>) -> Self {
        match result {
            Ok(state) => state.into(),
            Err(e) => RepResponse::Error {
                error: e.to_string(),
            },
        }
    }
}

impl From<RepCounterState> for RepResponse {
    fn from(state: RepCounterState) -> Self {
        RepResponse::Count { count: state.count }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::pose::{Arm, Landmark, LandmarkPoint, Phase};

    fn frame_with_angle(frame_no: usize, angle: f64) -> LandmarkFrame {
        let mut frame = LandmarkFrame {
            frame_no,
            ..LandmarkFrame::default()
        };
        let wrist = (
            0.5 + 0.2 * angle.to_radians().cos(),
            0.5 + 0.2 * angle.to_radians().sin(),
        );
        for (landmark, (x, y)) in [
            (Landmark::LeftShoulder, (0.7, 0.5)),
            (Landmark::LeftElbow, (0.5, 0.5)),
            (Landmark::LeftWrist, wrist),
        ] {
            frame.landmarks.insert(landmark, LandmarkPoint::new(x, y));
        }
        frame
    }

    fn run(processor: &mut FrameProcessor, angles: &[f64]) -> Vec<RepEvent> {
        angles
            .iter()
            .enumerate()
            .map(|(idx, angle)| processor.process(&frame_with_angle(idx, *angle)))
            .collect()
    }

    #[test]
    fn test_processor_counts_and_flags_new_reps() {
        let mut processor = FrameProcessor::default();
        let events = run(&mut processor, &[170., 80., 175., 85., 165.]);

        let flags: Vec<bool> = events.iter().map(|e| e.new_rep).collect();
        assert_eq!(flags, vec![false, false, true, false, true]);
        assert_eq!(processor.snapshot().count, 2);
        assert!((events[1].angle.unwrap() - 80.).abs() < 1e-6);
    }

    #[test]
    fn test_processor_skips_frames_without_person() {
        let mut processor = FrameProcessor::default();
        run(&mut processor, &[80.]);
        let event = processor.process(&LandmarkFrame::default());
        assert_eq!(event.angle, None);
        assert_eq!(event.state.phase, Phase::Flexed);

        run(&mut processor, &[170.]);
        assert_eq!(processor.snapshot().count, 1);
    }

    #[test]
    fn test_processor_with_smoothing() {
        let mut processor =
            FrameProcessor::new(JointExtractor::default(), RepThresholds::default(), true);
        // a single-frame spike is averaged away
        run(&mut processor, &[170., 170., 170., 60., 170., 170.]);
        assert_eq!(processor.snapshot().count, 0);

        run(&mut processor, &[60., 60., 60., 170., 170., 170.]);
        assert_eq!(processor.snapshot().count, 1);

        processor.reset();
        assert_eq!(processor.snapshot(), RepCounterState::default());
    }

    #[test]
    fn test_processor_from_config() {
        let config = AppConfig {
            arm: Arm::Right,
            ..AppConfig::default()
        };
        let mut processor = FrameProcessor::from_config(&config).unwrap();
        // only the left arm is present
        let event = processor.process(&frame_with_angle(0, 80.));
        assert_eq!(event.angle, None);

        let config = AppConfig {
            extended_threshold: 80.,
            flexed_threshold: 100.,
            ..AppConfig::default()
        };
        assert!(FrameProcessor::from_config(&config).is_err());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut registry = SessionRegistry::default();
        for (idx, angle) in [170., 80., 170.].iter().enumerate() {
            registry.process("alice", &frame_with_angle(idx, *angle));
        }
        registry.process("bob", &frame_with_angle(0, 80.));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.snapshot("alice").unwrap().count, 1);
        assert_eq!(
            registry.snapshot("bob").unwrap(),
            RepCounterState {
                count: 0,
                phase: Phase::Flexed
            }
        );
    }

    #[test]
    fn test_session_reset_and_end() {
        let mut registry = SessionRegistry::new(&AppConfig::default()).unwrap();
        for (idx, angle) in [80., 170.].iter().enumerate() {
            registry.process("alice", &frame_with_angle(idx, *angle));
        }
        assert_eq!(registry.reset("alice").unwrap(), RepCounterState::default());

        for (idx, angle) in [80., 170.].iter().enumerate() {
            registry.process("alice", &frame_with_angle(idx, *angle));
        }
        assert_eq!(registry.end("alice").unwrap().count, 1);
        assert!(registry.is_empty());

        assert!(matches!(
            registry.snapshot("alice"),
            Err(RepCounterError::UnknownSession { .. })
        ));
        assert!(registry.reset("carol").is_err());
        assert!(registry.end("carol").is_err());
    }

    #[test]
    fn test_sessions_on_independent_threads() {
        let handles: Vec<_> = (1..=4u32)
            .map(|reps| {
                thread::spawn(move || {
                    let mut processor = FrameProcessor::default();
                    for _ in 0..reps {
                        run(&mut processor, &[170., 120., 80., 120., 170.]);
                    }
                    processor.snapshot().count
                })
            })
            .collect();

        let counts: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(counts, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_response_envelope() {
        let state = RepCounterState {
            count: 12,
            phase: Phase::Extended,
        };
        assert_eq!(
            serde_json::to_string(&RepResponse::from(state)).unwrap(),
            r#"{"count":12}"#
        );

        let registry = SessionRegistry::default();
        let response = RepResponse::from_result(registry.snapshot("nobody"));
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"error":"Unknown exercise session: nobody"}"#
        );

        let parsed: RepResponse = serde_json::from_str(r#"{"count":3}"#).unwrap();
        assert_eq!(parsed, RepResponse::Count { count: 3 });
    }
}
