//! Body-part and joint tables for the player and pedestrian skeletons.
//!
//! Offsets are in the skeleton's base frame: origin between the hips,
//! +X to the right, +Y up, facing -Z.

use std::f32::consts::PI;

use glam::Vec3;

use crate::physics::JointKind;

const DEG: f32 = PI / 180.0;

/// Fixed geometry of one rigid segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartSpec {
    /// Half size of the segment's box.
    pub half_extents: Vec3,
    /// Kilograms.
    pub mass: f32,
    /// Centre of the segment in the base frame.
    pub offset: Vec3,
    /// Multiplier on the shared impact velocity.
    pub impulse_scale: f32,
}

/// A joint between two segments, given by slot index in the part table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSpec {
    /// Slot of the parent segment.
    pub parent: usize,
    /// Slot of the child segment.
    pub child: usize,
    /// Pivot in the base frame.
    pub pivot: Vec3,
    /// Twist axis for a cone joint, rotation axis for a hinge.
    pub axis: Vec3,
    /// Zero-angle reference, perpendicular to `axis`.
    pub reference: Vec3,
    /// Joint type and limits.
    pub kind: JointKind,
}

const fn mirror(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

const NECK: JointKind = JointKind::ConeTwist {
    swing1: 40.0 * DEG,
    swing2: 40.0 * DEG,
    twist: 30.0 * DEG,
};
const SHOULDER: JointKind = JointKind::ConeTwist {
    swing1: 90.0 * DEG,
    swing2: 60.0 * DEG,
    twist: 45.0 * DEG,
};
const HIP: JointKind = JointKind::ConeTwist {
    swing1: 60.0 * DEG,
    swing2: 45.0 * DEG,
    twist: 30.0 * DEG,
};
const BEND: JointKind = JointKind::Hinge {
    low: 0.0,
    high: 140.0 * DEG,
};

/// Segments of the player's ragdoll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPart {
    /// Head.
    Head,
    /// Torso, the root of the skeleton.
    Torso,
    /// Left upper arm.
    LeftUpperArm,
    /// Left forearm.
    LeftLowerArm,
    /// Right upper arm.
    RightUpperArm,
    /// Right forearm.
    RightLowerArm,
    /// Left thigh.
    LeftUpperLeg,
    /// Left shin.
    LeftLowerLeg,
    /// Right thigh.
    RightUpperLeg,
    /// Right shin.
    RightLowerLeg,
}

impl BodyPart {
    /// Every part, in slot order.
    pub const ALL: [Self; 10] = [
        Self::Head,
        Self::Torso,
        Self::LeftUpperArm,
        Self::LeftLowerArm,
        Self::RightUpperArm,
        Self::RightLowerArm,
        Self::LeftUpperLeg,
        Self::LeftLowerLeg,
        Self::RightUpperLeg,
        Self::RightLowerLeg,
    ];

    /// Slot of this part in [`BodyPart::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether a ground strike on this part counts as a ground impact.
    #[must_use]
    pub const fn is_core(self) -> bool {
        matches!(self, Self::Head | Self::Torso)
    }

    /// Geometry and mass of this part.
    #[must_use]
    pub const fn spec(self) -> PartSpec {
        const UPPER_ARM: PartSpec = PartSpec {
            half_extents: Vec3::new(0.05, 0.15, 0.05),
            mass: 2.5,
            offset: Vec3::new(-0.23, 0.37, 0.0),
            impulse_scale: 0.9,
        };
        const LOWER_ARM: PartSpec = PartSpec {
            half_extents: Vec3::new(0.045, 0.14, 0.045),
            mass: 1.5,
            offset: Vec3::new(-0.23, 0.08, 0.0),
            impulse_scale: 0.85,
        };
        const UPPER_LEG: PartSpec = PartSpec {
            half_extents: Vec3::new(0.08, 0.21, 0.08),
            mass: 8.0,
            offset: Vec3::new(-0.09, -0.21, 0.0),
            impulse_scale: 0.8,
        };
        const LOWER_LEG: PartSpec = PartSpec {
            half_extents: Vec3::new(0.06, 0.21, 0.06),
            mass: 4.0,
            offset: Vec3::new(-0.09, -0.63, 0.0),
            impulse_scale: 0.7,
        };
        match self {
            Self::Head => PartSpec {
                half_extents: Vec3::new(0.11, 0.12, 0.11),
                mass: 5.0,
                offset: Vec3::new(0.0, 0.70, 0.0),
                impulse_scale: 1.1,
            },
            Self::Torso => PartSpec {
                half_extents: Vec3::new(0.18, 0.28, 0.11),
                mass: 30.0,
                offset: Vec3::new(0.0, 0.28, 0.0),
                impulse_scale: 1.0,
            },
            Self::LeftUpperArm => UPPER_ARM,
            Self::LeftLowerArm => LOWER_ARM,
            Self::LeftUpperLeg => UPPER_LEG,
            Self::LeftLowerLeg => LOWER_LEG,
            Self::RightUpperArm => mirrored(UPPER_ARM),
            Self::RightLowerArm => mirrored(LOWER_ARM),
            Self::RightUpperLeg => mirrored(UPPER_LEG),
            Self::RightLowerLeg => mirrored(LOWER_LEG),
        }
    }
}

const fn mirrored(spec: PartSpec) -> PartSpec {
    PartSpec {
        offset: mirror(spec.offset),
        ..spec
    }
}

/// Joints of the player's ragdoll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerJoint {
    /// Torso to head.
    Neck,
    /// Torso to left upper arm.
    LeftShoulder,
    /// Torso to right upper arm.
    RightShoulder,
    /// Left elbow hinge.
    LeftElbow,
    /// Right elbow hinge.
    RightElbow,
    /// Torso to left thigh.
    LeftHip,
    /// Torso to right thigh.
    RightHip,
    /// Left knee hinge.
    LeftKnee,
    /// Right knee hinge.
    RightKnee,
}

impl PlayerJoint {
    /// Every joint, in slot order.
    pub const ALL: [Self; 9] = [
        Self::Neck,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
    ];

    /// Slot of this joint in [`PlayerJoint::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Elbows and knees bend on a single axis.
    #[must_use]
    pub const fn is_hinge(self) -> bool {
        matches!(
            self,
            Self::LeftElbow | Self::RightElbow | Self::LeftKnee | Self::RightKnee
        )
    }

    /// Connection, pivot and limits of this joint.
    #[must_use]
    pub const fn spec(self) -> JointSpec {
        use BodyPart as P;
        const SHOULDER_PIVOT: Vec3 = Vec3::new(-0.23, 0.52, 0.0);
        const ELBOW_PIVOT: Vec3 = Vec3::new(-0.23, 0.22, 0.0);
        const HIP_PIVOT: Vec3 = Vec3::new(-0.09, 0.0, 0.0);
        const KNEE_PIVOT: Vec3 = Vec3::new(-0.09, -0.42, 0.0);
        let (parent, child, pivot, axis, reference, kind) = match self {
            Self::Neck => (P::Torso, P::Head, Vec3::new(0.0, 0.57, 0.0), Vec3::Y, Vec3::Z, NECK),
            Self::LeftShoulder => (P::Torso, P::LeftUpperArm, SHOULDER_PIVOT, Vec3::NEG_Y, Vec3::X, SHOULDER),
            Self::RightShoulder => (
                P::Torso,
                P::RightUpperArm,
                mirror(SHOULDER_PIVOT),
                Vec3::NEG_Y,
                Vec3::X,
                SHOULDER,
            ),
            Self::LeftElbow => (P::LeftUpperArm, P::LeftLowerArm, ELBOW_PIVOT, Vec3::X, Vec3::NEG_Y, BEND),
            Self::RightElbow => (
                P::RightUpperArm,
                P::RightLowerArm,
                mirror(ELBOW_PIVOT),
                Vec3::X,
                Vec3::NEG_Y,
                BEND,
            ),
            Self::LeftHip => (P::Torso, P::LeftUpperLeg, HIP_PIVOT, Vec3::NEG_Y, Vec3::X, HIP),
            Self::RightHip => (P::Torso, P::RightUpperLeg, mirror(HIP_PIVOT), Vec3::NEG_Y, Vec3::X, HIP),
            // Knees flex backwards, so their axis points left.
            Self::LeftKnee => (P::LeftUpperLeg, P::LeftLowerLeg, KNEE_PIVOT, Vec3::NEG_X, Vec3::NEG_Y, BEND),
            Self::RightKnee => (
                P::RightUpperLeg,
                P::RightLowerLeg,
                mirror(KNEE_PIVOT),
                Vec3::NEG_X,
                Vec3::NEG_Y,
                BEND,
            ),
        };
        JointSpec {
            parent: parent.index(),
            child: child.index(),
            pivot,
            axis,
            reference,
            kind,
        }
    }
}

/// Segments of a pedestrian's simplified ragdoll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PedestrianPart {
    /// Head.
    Head,
    /// Torso, the root of the skeleton.
    Torso,
    /// Left arm.
    LeftArm,
    /// Right arm.
    RightArm,
    /// Left leg.
    LeftLeg,
    /// Right leg.
    RightLeg,
}

impl PedestrianPart {
    /// Every part, in slot order.
    pub const ALL: [Self; 6] = [
        Self::Head,
        Self::Torso,
        Self::LeftArm,
        Self::RightArm,
        Self::LeftLeg,
        Self::RightLeg,
    ];

    /// Slot of this part in [`PedestrianPart::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Geometry and mass of this part.
    #[must_use]
    pub const fn spec(self) -> PartSpec {
        const ARM: PartSpec = PartSpec {
            half_extents: Vec3::new(0.05, 0.3, 0.05),
            mass: 3.5,
            offset: Vec3::new(-0.22, 0.2, 0.0),
            impulse_scale: 0.9,
        };
        const LEG: PartSpec = PartSpec {
            half_extents: Vec3::new(0.08, 0.42, 0.08),
            mass: 11.0,
            offset: Vec3::new(-0.09, -0.42, 0.0),
            impulse_scale: 0.6,
        };
        match self {
            Self::Head => PartSpec {
                half_extents: Vec3::new(0.1, 0.11, 0.1),
                mass: 4.5,
                offset: Vec3::new(0.0, 0.67, 0.0),
                impulse_scale: 1.15,
            },
            Self::Torso => PartSpec {
                half_extents: Vec3::new(0.17, 0.27, 0.1),
                mass: 28.0,
                offset: Vec3::new(0.0, 0.27, 0.0),
                impulse_scale: 1.0,
            },
            Self::LeftArm => ARM,
            Self::RightArm => mirrored(ARM),
            Self::LeftLeg => LEG,
            Self::RightLeg => mirrored(LEG),
        }
    }
}

/// Joints of a pedestrian's ragdoll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PedestrianJoint {
    /// Torso to head.
    Neck,
    /// Torso to left arm.
    LeftShoulder,
    /// Torso to right arm.
    RightShoulder,
    /// Torso to left leg.
    LeftHip,
    /// Torso to right leg.
    RightHip,
}

impl PedestrianJoint {
    /// Every joint, in slot order.
    pub const ALL: [Self; 5] = [
        Self::Neck,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftHip,
        Self::RightHip,
    ];

    /// Connection, pivot and limits of this joint.
    #[must_use]
    pub const fn spec(self) -> JointSpec {
        use PedestrianPart as P;
        const SHOULDER_PIVOT: Vec3 = Vec3::new(-0.22, 0.5, 0.0);
        const HIP_PIVOT: Vec3 = Vec3::new(-0.09, 0.0, 0.0);
        let (parent, child, pivot, axis, reference, kind) = match self {
            Self::Neck => (P::Torso, P::Head, Vec3::new(0.0, 0.545, 0.0), Vec3::Y, Vec3::Z, NECK),
            Self::LeftShoulder => (P::Torso, P::LeftArm, SHOULDER_PIVOT, Vec3::NEG_Y, Vec3::X, SHOULDER),
            Self::RightShoulder => (P::Torso, P::RightArm, mirror(SHOULDER_PIVOT), Vec3::NEG_Y, Vec3::X, SHOULDER),
            Self::LeftHip => (P::Torso, P::LeftLeg, HIP_PIVOT, Vec3::NEG_Y, Vec3::X, HIP),
            Self::RightHip => (P::Torso, P::RightLeg, mirror(HIP_PIVOT), Vec3::NEG_Y, Vec3::X, HIP),
        };
        JointSpec {
            parent: parent.index(),
            child: child.index(),
            pivot,
            axis,
            reference,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    fn player_masses_match_anatomy() {
        let total: f32 = BodyPart::ALL.iter().map(|part| part.spec().mass).sum();
        // torso 30, head 5, arms 2 * (2.5 + 1.5), legs 2 * (8 + 4)
        assert_relative_eq!(total, 67.0);
    }

    #[rstest]
    fn every_part_is_jointed_except_the_root() {
        let mut children: Vec<usize> = PlayerJoint::ALL.iter().map(|j| j.spec().child).collect();
        children.sort_unstable();
        let mut expected: Vec<usize> = BodyPart::ALL
            .iter()
            .filter(|part| **part != BodyPart::Torso)
            .map(|part| part.index())
            .collect();
        expected.sort_unstable();
        assert_eq!(children, expected);
    }

    #[rstest]
    fn pivots_touch_both_segments() {
        for joint in PlayerJoint::ALL {
            let spec = joint.spec();
            for slot in [spec.parent, spec.child] {
                let body_part = BodyPart::ALL
                    .get(slot)
                    .copied()
                    .expect("joint slot names a part");
                let part = body_part.spec();
                let local = (spec.pivot - part.offset).abs();
                let slack = part.half_extents + Vec3::splat(0.06);
                assert!(
                    local.cmple(slack).all(),
                    "{joint:?} pivot outside {body_part:?}"
                );
            }
        }
    }

    #[rstest]
    fn hinges_are_elbows_and_knees() {
        let hinges = PlayerJoint::ALL.iter().filter(|j| j.is_hinge()).count();
        assert_eq!(hinges, 4);
        for joint in PlayerJoint::ALL {
            assert_eq!(
                joint.is_hinge(),
                matches!(joint.spec().kind, JointKind::Hinge { .. })
            );
        }
    }

    #[rstest]
    fn pedestrian_has_six_parts_five_joints() {
        assert_eq!(PedestrianPart::ALL.len(), 6);
        assert_eq!(PedestrianJoint::ALL.len(), 5);
        for joint in PedestrianJoint::ALL {
            assert_eq!(joint.spec().parent, PedestrianPart::Torso.index());
        }
    }
}
