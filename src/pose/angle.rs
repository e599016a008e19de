//! Joint angle from three landmark points.

use uom::si::angle::{degree, radian};
use uom::si::f64::Angle;

use super::Point2D;
use crate::RepCounterError;

const HALF_TURN_DEG: f64 = 180.;
const FULL_TURN_DEG: f64 = 360.;

/// Angle at `vertex` between the rays towards `proximal` and `distal`, in degrees.
///
/// The result is the absolute difference of the two ray bearings folded into `[0, 180]`,
/// so a straight limb measures 180° and a fully folded one 0°.
///
/// # Errors
///
/// * `InvalidInput` if any coordinate is NaN or infinite
/// * `DegenerateGeometry` if `vertex` coincides with `proximal` or `distal`
pub fn compute_angle(
    proximal: Point2D,
    vertex: Point2D,
    distal: Point2D,
) -> Result<f64, RepCounterError> {
    for (name, point) in [("proximal", proximal), ("vertex", vertex), ("distal", distal)] {
        if !point.is_finite() {
            return Err(RepCounterError::InvalidInput {
                reason: format!("{name} point ({}, {}) is not finite", point.x, point.y),
            });
        }
    }
    if vertex == proximal || vertex == distal {
        return Err(RepCounterError::DegenerateGeometry);
    }

    let bearing_distal = (distal.y - vertex.y).atan2(distal.x - vertex.x);
    let bearing_proximal = (proximal.y - vertex.y).atan2(proximal.x - vertex.x);
    let angle = Angle::new::<radian>(bearing_distal - bearing_proximal)
        .get::<degree>()
        .abs();

    let folded = if angle > HALF_TURN_DEG {
        FULL_TURN_DEG - angle
    } else {
        angle
    };
    // opposite bearings of exactly +/-pi can round just past a full turn
    Ok(folded.max(0.))
}
