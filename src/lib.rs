// Library interface for repcounter
// This allows integration tests and transport shells to access internal modules

pub mod config;
pub mod errors;
pub mod pose;
pub mod session;
pub mod writer;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::RepCounterError;
pub use pose::{
    AngleSample, Arm, JointTriple, Phase, Point2D, RepCounter, RepCounterState, RepThresholds,
    compute_angle,
};
pub use session::{FrameProcessor, RepResponse, SessionRegistry};
