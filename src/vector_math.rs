//! Basic vector math helper functions.
//! Heading vectors and planar helpers for the street frame, where yaw zero
//! faces down the negative Z axis and Y is up.
use glam::{Quat, Vec2, Vec3};

/// Unit heading on the ground plane for the given yaw.
///
/// # Examples
/// ```
/// use monowheel::vector_math::forward_from_yaw;
/// let forward = forward_from_yaw(0.0);
/// assert!((forward.z + 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    let (sin, cos) = yaw.sin_cos();
    Vec3::new(-sin, 0.0, -cos)
}

/// Unit vector to the rider's right for the given yaw.
#[must_use]
pub fn right_from_yaw(yaw: f32) -> Vec3 {
    let (sin, cos) = yaw.sin_cos();
    Vec3::new(cos, 0.0, -sin)
}

/// Rotation about +Y for the given yaw.
#[must_use]
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_rotation_y(yaw)
}

/// Projects a vector onto the XZ plane.
#[must_use]
pub fn planar(vector: Vec3) -> Vec2 {
    Vec2::new(vector.x, vector.z)
}

/// Horizontal distance between two points, ignoring height.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use monowheel::vector_math::planar_distance;
/// let d = planar_distance(Vec3::new(0.0, 5.0, 0.0), Vec3::new(3.0, 0.0, 4.0));
/// assert!((d - 5.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    planar(a).distance(planar(b))
}

/// Normalises `vector`, returning zero for invalid or zero input.
#[must_use]
pub fn normalize_or_zero(vector: Vec3) -> Vec3 {
    if !vector.is_finite() {
        return Vec3::ZERO;
    }
    vector.try_normalize().unwrap_or(Vec3::ZERO)
}

/// Yaw that faces from `from` towards `to` on the ground plane.
#[must_use]
pub fn yaw_towards(from: Vec3, to: Vec3) -> f32 {
    let delta = to - from;
    (-delta.x).atan2(-delta.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::f32::consts::FRAC_PI_2;

    #[rstest]
    #[case(0.0)]
    #[case(0.7)]
    #[case(-2.1)]
    fn right_is_perpendicular_to_forward(#[case] yaw: f32) {
        let forward = forward_from_yaw(yaw);
        let right = right_from_yaw(yaw);
        assert_relative_eq!(forward.dot(right), 0.0, epsilon = 1e-6);
        assert_relative_eq!(forward.cross(right).y, 1.0, epsilon = 1e-6);
    }

    #[rstest]
    fn yaw_rotation_matches_forward() {
        let yaw = FRAC_PI_2 / 3.0;
        let rotated = yaw_rotation(yaw) * Vec3::NEG_Z;
        let forward = forward_from_yaw(yaw);
        assert_relative_eq!(rotated.x, forward.x, epsilon = 1e-6);
        assert_relative_eq!(rotated.z, forward.z, epsilon = 1e-6);
    }

    #[rstest]
    fn yaw_towards_inverts_forward() {
        let yaw = 1.1;
        let target = forward_from_yaw(yaw) * 4.0;
        assert_relative_eq!(yaw_towards(Vec3::ZERO, target), yaw, epsilon = 1e-5);
    }

    #[rstest]
    fn normalize_rejects_nan() {
        assert_eq!(normalize_or_zero(Vec3::new(f32::NAN, 0.0, 1.0)), Vec3::ZERO);
        assert_eq!(normalize_or_zero(Vec3::ZERO), Vec3::ZERO);
    }
}
