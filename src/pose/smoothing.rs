use simple_moving_average::{SMA, SumTreeSMA};

use super::AngleSample;

/// Number of frames averaged by the angle smoother
pub const SMOOTHING_WINDOW: usize = 3;

/// Moving average over the last available angles. Unavailable frames pass through
/// and do not enter the window.
pub struct AngleSmoother {
    window: SumTreeSMA<f64, f64, SMOOTHING_WINDOW>,
}

impl AngleSmoother {
    pub fn new() -> Self {
        Self {
            window: SumTreeSMA::new(),
        }
    }

    pub fn smooth(&mut self, sample: AngleSample) -> AngleSample {
        match sample {
            AngleSample::Angle(angle) => {
                self.window.add_sample(angle);
                AngleSample::Angle(self.window.get_average())
            }
            AngleSample::Unavailable => AngleSample::Unavailable,
        }
    }

    pub fn reset(&mut self) {
        self.window = SumTreeSMA::new();
    }
}

impl Default for AngleSmoother {
    fn default() -> Self {
        Self::new()
    }
}
