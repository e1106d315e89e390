//! Planar joint-angle computation.
//!
//! Angles are measured between the positive x axis and the ray from an
//! origin keypoint to a second keypoint, in degrees.

use crate::Keypoint;

/// Angle of the ray `origin -> ray` in degrees, range `(-180, 180]`.
///
/// Pure and total for finite inputs; NaN coordinates produce a NaN angle,
/// which downstream threshold comparisons treat as "neither up nor down".
pub fn angle_degrees(origin: &Keypoint, ray: &Keypoint) -> f64 {
    (ray.y - origin.y).atan2(ray.x - origin.x).to_degrees()
}
