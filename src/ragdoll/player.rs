//! The rider's ten-segment ragdoll and the thrown EUC.

use glam::Vec3;

use super::impulse::{classify_fall, euc_impact, player_impact, spawn_rotation, FallKind, FallPose};
use super::rig::{Placement, Rig};
use super::skeleton::{BodyPart, PartSpec, PlayerJoint, JointSpec};
use crate::config::PhysicsTuning;
use crate::constants::{EUC_MASS, EUC_WHEEL_RADIUS, HIP_HEIGHT};
use crate::physics::{
    Activation, BodyDesc, BodyHandle, ColliderType, DynamicsWorld, PhysicsError,
};

/// Collision group shared by the rider's parts and the EUC.
pub(crate) const PLAYER_GROUP: u32 = 1;

const EUC_HALF_EXTENTS: Vec3 = Vec3::new(0.1, 0.25, 0.25);

#[derive(Debug, Clone)]
pub(crate) struct PlayerRagdoll {
    pub(crate) rig: Rig,
    pub(crate) euc: BodyHandle,
    pub(crate) kind: FallKind,
}

impl PlayerRagdoll {
    pub(crate) fn build(
        world: &mut DynamicsWorld,
        pose: &FallPose,
        tuning: &PhysicsTuning,
    ) -> Result<Self, PhysicsError> {
        let kind = classify_fall(pose.side_lean, pose.forward_lean);
        let rotation = spawn_rotation(pose.yaw, pose.side_lean, pose.forward_lean);
        let parts: Vec<PartSpec> = BodyPart::ALL.iter().map(|part| part.spec()).collect();
        let joints: Vec<JointSpec> = PlayerJoint::ALL.iter().map(|joint| joint.spec()).collect();
        let placement = Placement {
            base: pose.position + Vec3::Y * HIP_HEIGHT,
            rotation,
            impact: player_impact(pose),
            group: PLAYER_GROUP,
            collider_type: ColliderType::Generic,
        };
        let rig = Rig::assemble(world, &parts, &joints, &placement, tuning)?;

        // Tipped a little further than the rider so it lands on its side.
        let euc_rotation = spawn_rotation(pose.yaw, pose.side_lean * 1.5, pose.forward_lean * 1.5);
        let velocity = euc_impact(pose, EUC_WHEEL_RADIUS);
        let desc = BodyDesc::dynamic(EUC_MASS, EUC_HALF_EXTENTS)
            .with_pose(
                pose.position + Vec3::Y * (EUC_HALF_EXTENTS.y + 0.05),
                euc_rotation,
            )
            .with_velocity(velocity.linear, velocity.angular)
            .with_material(tuning.friction, tuning.restitution)
            .with_damping(tuning.linear_damping, tuning.angular_damping)
            .with_activation(Activation::NeverSleep)
            .in_group(PLAYER_GROUP);
        let euc = match world.add_body(&desc) {
            Ok(handle) => handle,
            Err(err) => {
                rig.teardown(world);
                return Err(err);
            }
        };
        Ok(Self { rig, euc, kind })
    }

    pub(crate) fn teardown(&self, world: &mut DynamicsWorld) {
        self.rig.teardown(world);
        world.remove_body(self.euc);
    }

    pub(crate) fn set_frozen(&self, world: &mut DynamicsWorld, frozen: bool) {
        self.rig.set_frozen(world, frozen);
        world.set_frozen(self.euc, frozen);
    }

    /// Which part a body belongs to, if any.
    pub(crate) fn part_of(&self, handle: BodyHandle) -> Option<BodyPart> {
        self.rig
            .slot_of(handle)
            .and_then(|slot| BodyPart::ALL.get(slot).copied())
    }
}
