use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

use super::{Phase, RepEvent};

/// Aggregate statistics over a processed rep stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepSummary {
    pub total_reps: u32,
    pub frames: usize,
    pub unavailable_frames: usize,
    /// Phase transitions, including the first one out of `Unknown`.
    pub phase_changes: usize,
    pub min_angle: Option<f64>,
    pub max_angle: Option<f64>,
}

impl RepSummary {
    pub fn from_events(events: &[RepEvent]) -> Self {
        let phase_changes = std::iter::once(Phase::Unknown)
            .chain(events.iter().map(|event| event.state.phase))
            .tuple_windows::<(_, _)>()
            .filter(|(prev, cur)| prev != cur)
            .count();

        let (min_angle, max_angle) = match events
            .iter()
            .filter_map(|event| event.angle)
            .minmax_by(|a, b| a.total_cmp(b))
        {
            MinMaxResult::NoElements => (None, None),
            MinMaxResult::OneElement(angle) => (Some(angle), Some(angle)),
            MinMaxResult::MinMax(min, max) => (Some(min), Some(max)),
        };

        Self {
            total_reps: events.last().map_or(0, |event| event.state.count),
            frames: events.len(),
            unavailable_frames: events.iter().filter(|event| event.angle.is_none()).count(),
            phase_changes,
            min_angle,
            max_angle,
        }
    }
}
