//! Per-frame facial ratios.
//!
//! Each function is a pure function of landmark positions in pixel
//! space. Distances are plain Euclidean.

use crate::landmarks::Point2;

/// Guards every ratio against a zero denominator.
pub const EPSILON: f64 = 1e-6;

/// Multiplier applied to the lip gap / face scale ratio.
pub const JAW_SENSITIVITY: f64 = 6.0;

/// Normalized brow-to-lid distance at which tension starts rising.
pub const BROW_REFERENCE: f64 = 0.043;

/// Normalized distance span over which tension goes from 0 to 1.
pub const BROW_SPAN: f64 = 0.02;

/// Six-point eye aspect ratio.
///
/// `p1`/`p4` are the horizontal corners; `p2`/`p6` and `p3`/`p5` are the
/// vertical lid pairs.
pub fn eye_aspect_ratio(p: [Point2; 6]) -> f64 {
    let [p1, p2, p3, p4, p5, p6] = p;
    (p2.distance(p6) + p3.distance(p5)) / (2.0 * p1.distance(p4) + EPSILON)
}

/// Nose-to-chin distance used to normalize the other measurements.
pub fn face_scale(nose: Point2, chin: Point2) -> f64 {
    nose.distance(chin) + EPSILON
}

/// Inter-lip gap relative to face scale, clamped to [0, 1].
pub fn jaw_openness(upper_lip: Point2, lower_lip: Point2, face_scale: f64) -> f64 {
    (upper_lip.distance(lower_lip) / face_scale * JAW_SENSITIVITY).clamp(0.0, 1.0)
}

/// Brow tension in [0, 1]; a brow closer to the eyelid reads as tenser.
pub fn brow_tension(brow: Point2, eye_top: Point2, face_scale: f64) -> f64 {
    let norm = brow.distance(eye_top) / (face_scale + EPSILON);
    ((BROW_REFERENCE - norm) / BROW_SPAN).clamp(0.0, 1.0)
}
