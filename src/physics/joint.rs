//! Cone-twist and hinge joints solved as positional constraints.
//!
//! Each joint stores its pivot and reference axes in both bodies' local
//! frames, captured when the joint is created. The pose at creation is the
//! joint's zero angle.

use glam::Vec3;

use super::body::RigidBody;
use super::world::BodyHandle;

/// Limits of a joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointKind {
    /// Ball-and-socket with an elliptical swing cone and a twist range.
    ///
    /// `swing1` bounds swing towards the reference axis, `swing2` towards
    /// the axis perpendicular to both twist and reference. All in radians.
    ConeTwist {
        /// Swing limit towards the reference axis.
        swing1: f32,
        /// Swing limit towards the third axis.
        swing2: f32,
        /// Twist limit either side of zero.
        twist: f32,
    },
    /// Single rotation axis with an angle range in radians.
    Hinge {
        /// Lowest permitted angle.
        low: f32,
        /// Highest permitted angle.
        high: f32,
    },
}

/// Construction parameters for a joint. Vectors are in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDesc {
    /// Parent body.
    pub body1: BodyHandle,
    /// Child body.
    pub body2: BodyHandle,
    /// Shared pivot.
    pub anchor: Vec3,
    /// Twist axis for a cone joint, rotation axis for a hinge.
    pub axis: Vec3,
    /// Any direction perpendicular to `axis`; the zero-angle reference.
    pub reference: Vec3,
    /// Joint type and limits.
    pub kind: JointKind,
}

#[derive(Debug, Clone)]
pub(crate) struct Joint {
    pub(crate) body1: BodyHandle,
    pub(crate) body2: BodyHandle,
    anchor1: Vec3,
    anchor2: Vec3,
    axis1: Vec3,
    axis2: Vec3,
    ref1: Vec3,
    ref2: Vec3,
    pub(crate) kind: JointKind,
}

const EPSILON: f32 = 1e-6;

impl Joint {
    pub(crate) fn new(desc: &JointDesc, axis: Vec3, reference: Vec3, b1: &RigidBody, b2: &RigidBody) -> Self {
        let inv1 = b1.rotation.inverse();
        let inv2 = b2.rotation.inverse();
        Self {
            body1: desc.body1,
            body2: desc.body2,
            anchor1: b1.world_to_local(desc.anchor),
            anchor2: b2.world_to_local(desc.anchor),
            axis1: inv1 * axis,
            axis2: inv2 * axis,
            ref1: inv1 * reference,
            ref2: inv2 * reference,
            kind: desc.kind,
        }
    }

    /// Runs every positional correction of this joint once.
    pub(crate) fn solve(&self, b1: &mut RigidBody, b2: &mut RigidBody) {
        match self.kind {
            JointKind::Hinge { low, high } => {
                self.align_axes(b1, b2);
                self.limit_hinge(b1, b2, low, high);
            }
            JointKind::ConeTwist {
                swing1,
                swing2,
                twist,
            } => {
                self.limit_swing(b1, b2, swing1, swing2);
                self.limit_twist(b1, b2, twist);
            }
        }
        self.attach(b1, b2);
    }

    /// Current hinge angle, or the swing angle for a cone joint.
    pub(crate) fn angle(&self, b1: &RigidBody, b2: &RigidBody) -> f32 {
        match self.kind {
            JointKind::Hinge { .. } => self.hinge_angle(b1, b2),
            JointKind::ConeTwist { .. } => {
                let t1 = b1.rotation * self.axis1;
                let t2 = b2.rotation * self.axis2;
                t1.dot(t2).clamp(-1.0, 1.0).acos()
            }
        }
    }

    fn hinge_angle(&self, b1: &RigidBody, b2: &RigidBody) -> f32 {
        let a = b1.rotation * self.axis1;
        let r1 = b1.rotation * self.ref1;
        let r2 = b2.rotation * self.ref2;
        a.dot(r1.cross(r2)).atan2(r1.dot(r2))
    }

    /// Pulls the two pivots together.
    fn attach(&self, b1: &mut RigidBody, b2: &mut RigidBody) {
        let r1 = b1.rotation * self.anchor1;
        let r2 = b2.rotation * self.anchor2;
        let delta = (b2.position + r2) - (b1.position + r1);
        let c = delta.length();
        if c < EPSILON {
            return;
        }
        let n = delta / c;
        let w = b1.generalized_inverse_mass(r1, n) + b2.generalized_inverse_mass(r2, n);
        if w < EPSILON {
            return;
        }
        let p = n * (c / w);
        b1.apply_positional(p, r1);
        b2.apply_positional(-p, r2);
    }

    fn align_axes(&self, b1: &mut RigidBody, b2: &mut RigidBody) {
        let a1 = b1.rotation * self.axis1;
        let a2 = b2.rotation * self.axis2;
        let cross = a1.cross(a2);
        let sin = cross.length();
        if sin < EPSILON {
            return;
        }
        let angle = sin.atan2(a1.dot(a2));
        rotate_apart(b1, b2, cross / sin, angle);
    }

    fn limit_hinge(&self, b1: &mut RigidBody, b2: &mut RigidBody, low: f32, high: f32) {
        let phi = self.hinge_angle(b1, b2);
        let excess = phi - phi.clamp(low, high);
        if excess.abs() < EPSILON {
            return;
        }
        let axis = b1.rotation * self.axis1;
        rotate_apart(b1, b2, axis, excess);
    }

    fn limit_swing(&self, b1: &mut RigidBody, b2: &mut RigidBody, swing1: f32, swing2: f32) {
        let t1 = b1.rotation * self.axis1;
        let t2 = b2.rotation * self.axis2;
        let cross = t1.cross(t2);
        let sin = cross.length();
        if sin < EPSILON {
            return;
        }
        let theta = sin.atan2(t1.dot(t2));
        let u = b1.rotation * self.ref1;
        let v = t1.cross(u);
        let swing = t2 - t1 * t1.dot(t2);
        let psi = swing.dot(v).atan2(swing.dot(u));
        let limit = elliptical_limit(swing1, swing2, psi);
        if theta <= limit {
            return;
        }
        rotate_apart(b1, b2, cross / sin, theta - limit);
    }

    fn limit_twist(&self, b1: &mut RigidBody, b2: &mut RigidBody, twist: f32) {
        let t1 = b1.rotation * self.axis1;
        let t2 = b2.rotation * self.axis2;
        let Some(n) = (t1 + t2).try_normalize() else {
            return;
        };
        let r1 = b1.rotation * self.ref1;
        let r2 = b2.rotation * self.ref2;
        let Some(a) = (r1 - n * n.dot(r1)).try_normalize() else {
            return;
        };
        let Some(b) = (r2 - n * n.dot(r2)).try_normalize() else {
            return;
        };
        let phi = n.dot(a.cross(b)).atan2(a.dot(b));
        let excess = phi - phi.clamp(-twist, twist);
        if excess.abs() < EPSILON {
            return;
        }
        rotate_apart(b1, b2, n, excess);
    }
}

/// Swing limit of an elliptical cone in direction `psi`.
pub(crate) fn elliptical_limit(swing1: f32, swing2: f32, psi: f32) -> f32 {
    let (sin, cos) = psi.sin_cos();
    let denom = (swing2 * cos).hypot(swing1 * sin);
    if denom < EPSILON {
        return swing1.min(swing2);
    }
    swing1 * swing2 / denom
}

/// Reduces the relative rotation about `axis` by `angle`, body 1 turning
/// towards body 2 and body 2 back towards body 1.
fn rotate_apart(b1: &mut RigidBody, b2: &mut RigidBody, axis: Vec3, angle: f32) {
    let w = b1.angular_inverse_mass(axis) + b2.angular_inverse_mass(axis);
    if w < EPSILON {
        return;
    }
    let impulse = axis * (angle / w);
    let d1 = b1.inv_inertia_world(impulse);
    let d2 = b2.inv_inertia_world(impulse);
    b1.apply_rotation(d1);
    b2.apply_rotation(-d2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::f32::consts::FRAC_PI_2;

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(FRAC_PI_2, 0.5)]
    fn ellipse_hits_axis_limits(#[case] psi: f32, #[case] expected: f32) {
        assert_relative_eq!(elliptical_limit(1.0, 0.5, psi), expected, epsilon = 1e-5);
    }

    #[rstest]
    fn circular_cone_is_constant() {
        for step in 0..8 {
            let psi = step as f32 * 0.7;
            assert_relative_eq!(elliptical_limit(0.6, 0.6, psi), 0.6, epsilon = 1e-5);
        }
    }
}
