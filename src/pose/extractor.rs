use std::{fmt, str::FromStr};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{AngleSample, JointTriple, Landmark, LandmarkFrame};

/// Minimum landmark visibility to trust a detection, same confidence the pose
/// estimator is configured with.
pub const DEFAULT_MIN_VISIBILITY: f32 = 0.7;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arm {
    #[default]
    Left,
    Right,
}

impl Arm {
    /// Shoulder, elbow and wrist landmarks for this arm
    pub fn landmarks(self) -> [Landmark; 3] {
        match self {
            Arm::Left => [
                Landmark::LeftShoulder,
                Landmark::LeftElbow,
                Landmark::LeftWrist,
            ],
            Arm::Right => [
                Landmark::RightShoulder,
                Landmark::RightElbow,
                Landmark::RightWrist,
            ],
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arm::Left => write!(f, "left"),
            Arm::Right => write!(f, "right"),
        }
    }
}

impl FromStr for Arm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" | "l" => Ok(Arm::Left),
            "right" | "r" => Ok(Arm::Right),
            other => Err(format!("unknown arm '{other}', expected left or right")),
        }
    }
}

/// Turns a landmark frame into the elbow angle sample fed to the rep counter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointExtractor {
    pub arm: Arm,
    pub min_visibility: f32,
}

impl Default for JointExtractor {
    fn default() -> Self {
        Self {
            arm: Arm::default(),
            min_visibility: DEFAULT_MIN_VISIBILITY,
        }
    }
}

impl JointExtractor {
    pub fn new(arm: Arm, min_visibility: f32) -> Self {
        Self {
            arm,
            min_visibility,
        }
    }

    /// The shoulder/elbow/wrist triple, or `None` when any of them is missing or
    /// reported below `min_visibility`. Landmarks without a visibility score are trusted.
    pub fn joint_triple(&self, frame: &LandmarkFrame) -> Option<JointTriple> {
        let [shoulder, elbow, wrist] = self.arm.landmarks().map(|landmark| {
            frame
                .landmark(landmark)
                .filter(|lm| lm.visibility.is_none_or(|v| v >= self.min_visibility))
                .map(|lm| lm.point())
        });
        Some(JointTriple::new(shoulder?, elbow?, wrist?))
    }

    pub fn sample(&self, frame: &LandmarkFrame) -> AngleSample {
        let Some(triple) = self.joint_triple(frame) else {
            return AngleSample::Unavailable;
        };
        match triple.angle() {
            Ok(angle) => AngleSample::Angle(angle),
            Err(e) => {
                debug!("Skipping frame {}: {}", frame.frame_no, e);
                AngleSample::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::LandmarkPoint;

    fn arm_frame(shoulder: (f64, f64), elbow: (f64, f64), wrist: (f64, f64)) -> LandmarkFrame {
        let mut frame = LandmarkFrame::default();
        for (landmark, (x, y)) in [
            (Landmark::LeftShoulder, shoulder),
            (Landmark::LeftElbow, elbow),
            (Landmark::LeftWrist, wrist),
        ] {
            frame
                .landmarks
                .insert(landmark, LandmarkPoint::new(x, y).with_visibility(0.95));
        }
        frame
    }

    #[test]
    fn test_left_arm_angle() {
        let extractor = JointExtractor::default();
        let frame = arm_frame((0.0, 0.0), (0.5, 0.0), (0.5, 0.5));
        match extractor.sample(&frame) {
            AngleSample::Angle(angle) => assert!((angle - 90.0).abs() < 1e-6),
            AngleSample::Unavailable => panic!("Expected an angle"),
        }
    }

    #[test]
    fn test_missing_arm_is_unavailable() {
        let frame = arm_frame((0.0, 0.0), (0.5, 0.0), (0.5, 0.5));
        let extractor = JointExtractor::new(Arm::Right, DEFAULT_MIN_VISIBILITY);
        assert_eq!(extractor.joint_triple(&frame), None);
        assert_eq!(extractor.sample(&frame), AngleSample::Unavailable);

        let extractor = JointExtractor::default();
        assert_eq!(
            extractor.sample(&LandmarkFrame::default()),
            AngleSample::Unavailable
        );
    }

    #[test]
    fn test_low_visibility_is_unavailable() {
        let mut frame = arm_frame((0.0, 0.0), (0.5, 0.0), (1.0, 0.0));
        frame
            .landmarks
            .insert(Landmark::LeftWrist, LandmarkPoint::new(1.0, 0.0).with_visibility(0.2));
        assert_eq!(
            JointExtractor::default().sample(&frame),
            AngleSample::Unavailable
        );

        // a lower confidence bar accepts it
        let lenient = JointExtractor::new(Arm::Left, 0.1);
        assert!(matches!(lenient.sample(&frame), AngleSample::Angle(_)));
    }

    #[test]
    fn test_missing_visibility_is_trusted() {
        let mut frame = LandmarkFrame::default();
        frame
            .landmarks
            .insert(Landmark::RightShoulder, LandmarkPoint::new(0.0, 0.0));
        frame
            .landmarks
            .insert(Landmark::RightElbow, LandmarkPoint::new(0.5, 0.0));
        frame
            .landmarks
            .insert(Landmark::RightWrist, LandmarkPoint::new(1.0, 0.0));
        let extractor = JointExtractor::new(Arm::Right, 0.9);
        assert!(extractor.joint_triple(&frame).is_some());
    }

    #[test]
    fn test_degenerate_arm_is_unavailable() {
        let frame = arm_frame((0.5, 0.5), (0.5, 0.5), (1.0, 0.0));
        assert_eq!(
            JointExtractor::default().sample(&frame),
            AngleSample::Unavailable
        );

        let frame = arm_frame((f64::NAN, 0.5), (0.5, 0.5), (1.0, 0.0));
        assert_eq!(
            JointExtractor::default().sample(&frame),
            AngleSample::Unavailable
        );
    }

    #[test]
    fn test_arm_from_str() {
        assert_eq!("left".parse::<Arm>(), Ok(Arm::Left));
        assert_eq!("RIGHT".parse::<Arm>(), Ok(Arm::Right));
        assert_eq!("r".parse::<Arm>(), Ok(Arm::Right));
        assert!("both".parse::<Arm>().is_err());
        assert_eq!(Arm::Right.to_string(), "right");
    }
}
