//! Joint geometry helpers
//!
//! Angle at the elbow via the dot product of elbow→shoulder and elbow→wrist,
//! and signed vertical offsets in normalized image space (smaller y = higher).

use thiserror::Error;

use crate::pose::Landmark;

/// Vectors shorter than this are treated as coincident joints
const MIN_MAGNITUDE: f32 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("degenerate vector: joints coincide, angle is undetermined")]
pub struct DegenerateVectorError;

/// Angle at `elbow` in degrees, in `[0, 180]`.
///
/// - 90° = arm bent at a right angle
/// - 180° = fully straight
pub fn angle_at(
    shoulder: Landmark,
    elbow: Landmark,
    wrist: Landmark,
) -> Result<f32, DegenerateVectorError> {
    // upper arm and forearm, both anchored at the elbow
    let v1 = (shoulder.x - elbow.x, shoulder.y - elbow.y);
    let v2 = (wrist.x - elbow.x, wrist.y - elbow.y);

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let mag1 = v1.0.hypot(v1.1);
    let mag2 = v2.0.hypot(v2.1);

    if mag1 < MIN_MAGNITUDE || mag2 < MIN_MAGNITUDE {
        return Err(DegenerateVectorError);
    }

    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    Ok(cos_angle.acos().to_degrees())
}

/// `a.y - b.y`; negative when `a` sits above `b` on screen
pub fn vertical_offset(a: Landmark, b: Landmark) -> f32 {
    a.y - b.y
}

/// True when `wrist` is above `shoulder` by strictly more than `thresh`
pub fn is_raised_above(wrist: Landmark, shoulder: Landmark, thresh: f32) -> bool {
    vertical_offset(wrist, shoulder) < -thresh
}

/// True when `wrist` is below `shoulder` by strictly more than `thresh`
pub fn is_lowered_below(wrist: Landmark, shoulder: Landmark, thresh: f32) -> bool {
    vertical_offset(wrist, shoulder) > thresh
}
