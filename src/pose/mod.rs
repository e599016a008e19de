pub mod angle;
pub mod collector;
pub mod extractor;
pub mod producer;
pub mod rep_counter;
pub mod smoothing;
pub mod summary;

use std::collections::HashMap;

pub use angle::compute_angle;
pub use collector::{ReplayHandle, collect_reps, spawn_replay};
pub use extractor::{Arm, JointExtractor};
pub use rep_counter::{Phase, RepCounter, RepCounterState, RepThresholds};
use serde::{Deserialize, Serialize};

use crate::RepCounterError;

/// A point in image space. Pose estimators report normalized coordinates in `[0,1]x[0,1]`
/// but any consistent unit works since only bearings are used.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Three points defining the angle measured at `vertex`, e.g. shoulder, elbow, wrist.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointTriple {
    pub proximal: Point2D,
    pub vertex: Point2D,
    pub distal: Point2D,
}

impl JointTriple {
    pub fn new(proximal: Point2D, vertex: Point2D, distal: Point2D) -> Self {
        Self {
            proximal,
            vertex,
            distal,
        }
    }

    /// Joint angle in degrees, see [`compute_angle`].
    pub fn angle(&self) -> Result<f64, RepCounterError> {
        compute_angle(self.proximal, self.vertex, self.distal)
    }
}

/// A single joint angle measurement fed to the [`RepCounter`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum AngleSample {
    /// Joint angle in degrees, `[0, 180]`
    Angle(f64),
    /// No measurement for this frame (no person detected, occluded joint, bad geometry)
    Unavailable,
}

impl AngleSample {
    pub fn degrees(&self) -> Option<f64> {
        match self {
            AngleSample::Angle(degrees) => Some(*degrees),
            AngleSample::Unavailable => None,
        }
    }
}

impl From<Option<f64>> for AngleSample {
    fn from(value: Option<f64>) -> Self {
        value.map_or(AngleSample::Unavailable, AngleSample::Angle)
    }
}

/// The 33 landmarks of the MediaPipe Pose topology, in estimator output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Nose = 0,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder = 11,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip = 23,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl Landmark {
    pub const COUNT: usize = 33;

    pub const ALL: [Landmark; Landmark::COUNT] = [
        Landmark::Nose,
        Landmark::LeftEyeInner,
        Landmark::LeftEye,
        Landmark::LeftEyeOuter,
        Landmark::RightEyeInner,
        Landmark::RightEye,
        Landmark::RightEyeOuter,
        Landmark::LeftEar,
        Landmark::RightEar,
        Landmark::MouthLeft,
        Landmark::MouthRight,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::LeftPinky,
        Landmark::RightPinky,
        Landmark::LeftIndex,
        Landmark::RightIndex,
        Landmark::LeftThumb,
        Landmark::RightThumb,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftAnkle,
        Landmark::RightAnkle,
        Landmark::LeftHeel,
        Landmark::RightHeel,
        Landmark::LeftFootIndex,
        Landmark::RightFootIndex,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// A landmark position as reported by the pose estimator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    /// Estimator confidence that the landmark is visible, `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn point(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// All landmarks detected in one video frame. An empty map means the estimator
/// did not find a person.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub frame_no: usize,
    pub timestamp_ms: u128,
    #[serde(default)]
    pub landmarks: HashMap<Landmark, LandmarkPoint>,
}

impl LandmarkFrame {
    /// Build a frame from the estimator's ordered landmark list. Entries beyond the
    /// known topology are ignored.
    pub fn from_pose_landmarks(
        frame_no: usize,
        timestamp_ms: u128,
        points: &[LandmarkPoint],
    ) -> Self {
        let landmarks = points
            .iter()
            .enumerate()
            .filter_map(|(idx, point)| Landmark::from_index(idx).map(|lm| (lm, *point)))
            .collect();
        Self {
            frame_no,
            timestamp_ms,
            landmarks,
        }
    }

    pub fn landmark(&self, landmark: Landmark) -> Option<&LandmarkPoint> {
        self.landmarks.get(&landmark)
    }

    pub fn has_person(&self) -> bool {
        !self.landmarks.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub subject: String,
    pub exercise: String,
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self {
            subject: "Unknown".to_string(),
            exercise: "push-up".to_string(),
        }
    }
}

/// One record of a recorded landmark stream (JSON lines).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LandmarkOutput {
    SessionStart(SessionInfo),
    Frame(Box<LandmarkFrame>),
}

/// Result of feeding one frame through the counter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepEvent {
    pub frame_no: usize,
    pub timestamp_ms: u128,
    /// Angle that reached the counter, `None` when the frame was skipped
    pub angle: Option<f64>,
    pub state: RepCounterState,
    /// Whether this frame completed a repetition
    pub new_rep: bool,
}

/// One record of the rep stream broadcast to consumers and written to disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RepOutput {
    SessionStart(SessionInfo),
    Rep(RepEvent),
}
