//! Initial velocities handed to freshly built ragdolls.

use glam::{Quat, Vec3};

use crate::constants::{HARD_FALL_LEAN, LEAN_TILT};
use crate::vector_math::{forward_from_yaw, normalize_or_zero, right_from_yaw, yaw_rotation};

/// Severity of a player fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallKind {
    /// Lean well past upright: a collision or a tip-over.
    Hard,
    /// Near-upright failure such as a motor cutout.
    Soft,
}

/// Rider and vehicle state at the instant of failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallPose {
    /// EUC ground contact point.
    pub position: Vec3,
    /// Heading, radians.
    pub yaw: f32,
    /// Rider velocity, m/s.
    pub velocity: Vec3,
    /// Side lean at the fall.
    pub side_lean: f32,
    /// Forward lean at the fall.
    pub forward_lean: f32,
}

/// Linear and angular velocity applied to a set of bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImpactVelocity {
    /// Metres per second.
    pub linear: Vec3,
    /// Radians per second.
    pub angular: Vec3,
}

impl ImpactVelocity {
    /// Both velocities multiplied by `scale`.
    #[must_use]
    pub fn scaled(self, scale: f32) -> Self {
        Self {
            linear: self.linear * scale,
            angular: self.angular * scale,
        }
    }
}

/// Classifies a fall by lean magnitude.
///
/// # Examples
/// ```
/// use monowheel::ragdoll::{classify_fall, FallKind};
/// assert_eq!(classify_fall(0.1, 0.1), FallKind::Soft);
/// assert_eq!(classify_fall(0.0, 0.9), FallKind::Hard);
/// ```
#[must_use]
pub fn classify_fall(side_lean: f32, forward_lean: f32) -> FallKind {
    if side_lean.hypot(forward_lean) > HARD_FALL_LEAN {
        FallKind::Hard
    } else {
        FallKind::Soft
    }
}

/// Horizontal direction the rider is leaning towards; straight ahead when
/// upright.
#[must_use]
pub fn lean_direction(yaw: f32, side_lean: f32, forward_lean: f32) -> Vec3 {
    let lean = forward_from_yaw(yaw) * forward_lean + right_from_yaw(yaw) * side_lean;
    let direction = normalize_or_zero(lean);
    if direction == Vec3::ZERO {
        forward_from_yaw(yaw)
    } else {
        direction
    }
}

/// Orientation of the rider at spawn: heading plus a tilt into the lean.
#[must_use]
pub fn spawn_rotation(yaw: f32, side_lean: f32, forward_lean: f32) -> Quat {
    yaw_rotation(yaw)
        * Quat::from_rotation_x(-forward_lean * LEAN_TILT)
        * Quat::from_rotation_z(-side_lean * LEAN_TILT)
}

/// Shared impact velocity for the player's ragdoll.
///
/// Hard falls carry more of the lean into a forward push, a bigger hop and
/// a faster tumble; both keep most of the rider's momentum.
#[must_use]
pub fn player_impact(pose: &FallPose) -> ImpactVelocity {
    let kind = classify_fall(pose.side_lean, pose.forward_lean);
    let magnitude = pose.side_lean.hypot(pose.forward_lean).clamp(0.25, 1.5);
    let direction = lean_direction(pose.yaw, pose.side_lean, pose.forward_lean);
    let (push, lift, spin) = match kind {
        FallKind::Hard => (2.5, 2.5, 4.0),
        FallKind::Soft => (1.2, 0.8, 2.0),
    };
    let momentum = if pose.velocity.is_finite() {
        pose.velocity * 0.9
    } else {
        Vec3::ZERO
    };
    ImpactVelocity {
        linear: momentum + direction * (push * magnitude) + Vec3::Y * lift,
        angular: Vec3::Y.cross(direction) * spin,
    }
}

/// Velocity for the rider's EUC: thrown along with the rider, spinning the
/// way the wheel was rolling.
#[must_use]
pub fn euc_impact(pose: &FallPose, wheel_radius: f32) -> ImpactVelocity {
    let velocity = if pose.velocity.is_finite() {
        pose.velocity
    } else {
        Vec3::ZERO
    };
    let roll = Vec3::Y.cross(velocity) / wheel_radius;
    ImpactVelocity {
        linear: velocity * 0.8 + Vec3::Y * 0.5,
        angular: roll.clamp_length_max(25.0),
    }
}

/// Stumble given to a knocked-down pedestrian: mostly horizontal, capped.
#[must_use]
pub fn stumble_impact(impact_speed: f32, direction: Vec3) -> ImpactVelocity {
    let speed = if impact_speed.is_finite() {
        impact_speed.max(0.0)
    } else {
        0.0
    };
    let flat = normalize_or_zero(Vec3::new(direction.x, 0.0, direction.z));
    let heading = if flat == Vec3::ZERO { Vec3::NEG_Z } else { flat };
    ImpactVelocity {
        linear: heading * (speed * 0.6).min(8.0) + Vec3::Y * 0.5,
        angular: Vec3::Y.cross(heading) * 0.3_f32.mul_add(speed, 1.5).min(6.0),
    }
}
