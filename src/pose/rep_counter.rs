use serde::{Deserialize, Serialize};

use super::AngleSample;
use crate::RepCounterError;

/// Elbow angle at or above which the arms are considered straight
pub const DEFAULT_EXTENDED_THRESHOLD: f64 = 160.;
/// Elbow angle at or below which the arms are considered bent
pub const DEFAULT_FLEXED_THRESHOLD: f64 = 90.;

/// The counter's belief about the current joint configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Unknown,
    Extended,
    Flexed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepCounterState {
    pub count: u32,
    pub phase: Phase,
}

/// Hysteresis band of the counter. Angles strictly between `flexed` and `extended`
/// never change the phase.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepThresholds {
    pub extended: f64,
    pub flexed: f64,
}

impl Default for RepThresholds {
    fn default() -> Self {
        Self {
            extended: DEFAULT_EXTENDED_THRESHOLD,
            flexed: DEFAULT_FLEXED_THRESHOLD,
        }
    }
}

impl RepThresholds {
    pub fn new(extended: f64, flexed: f64) -> Result<Self, RepCounterError> {
        if !extended.is_finite() || !flexed.is_finite() || flexed >= extended {
            return Err(RepCounterError::InvalidThresholds { extended, flexed });
        }
        Ok(Self { extended, flexed })
    }

    fn target_phase(&self, angle: f64) -> Option<Phase> {
        if angle >= self.extended {
            Some(Phase::Extended)
        } else if angle <= self.flexed {
            Some(Phase::Flexed)
        } else {
            None
        }
    }
}

/// Counts repetitions on the flexed -> extended edge of a joint angle stream.
///
/// The counter starts in `Phase::Unknown` so a stream that begins with the arms already
/// straight does not count a rep. Each instance owns its state; run one counter per
/// exercise session.
#[derive(Clone, Debug, Default)]
pub struct RepCounter {
    thresholds: RepThresholds,
    state: RepCounterState,
}

impl RepCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: RepThresholds) -> Self {
        Self {
            thresholds,
            state: RepCounterState::default(),
        }
    }

    pub fn thresholds(&self) -> RepThresholds {
        self.thresholds
    }

    /// Apply one sample and return the resulting state. Never fails: unavailable samples
    /// and angles inside the dead zone leave the state untouched.
    pub fn update(&mut self, sample: AngleSample) -> RepCounterState {
        let AngleSample::Angle(angle) = sample else {
            return self.state;
        };

        if let Some(target) = self.thresholds.target_phase(angle)
            && target != self.state.phase
        {
            if self.state.phase == Phase::Flexed && target == Phase::Extended {
                self.state.count = self.state.count.saturating_add(1);
            }
            self.state.phase = target;
        }
        self.state
    }

    pub fn reset(&mut self) {
        self.state = RepCounterState::default();
    }

    pub fn snapshot(&self) -> RepCounterState {
        self.state
    }
}
