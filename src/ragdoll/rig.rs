//! Building and tearing down articulated bodies in a [`DynamicsWorld`].

use glam::{Quat, Vec3};

use super::impulse::ImpactVelocity;
use super::skeleton::{JointSpec, PartSpec};
use super::BodyPose;
use crate::config::PhysicsTuning;
use crate::physics::{
    Activation, BodyDesc, BodyHandle, ColliderType, DynamicsWorld, JointDesc, JointHandle,
    PhysicsError,
};

/// Bodies and joints of one ragdoll, in part-table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rig {
    pub(crate) bodies: Vec<BodyHandle>,
    pub(crate) joints: Vec<JointHandle>,
}

/// Where and how a rig is spawned.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placement {
    pub(crate) base: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) impact: ImpactVelocity,
    pub(crate) group: u32,
    pub(crate) collider_type: ColliderType,
}

impl Rig {
    /// Creates every part and joint. On failure, anything already created
    /// is removed again.
    pub(crate) fn assemble(
        world: &mut DynamicsWorld,
        parts: &[PartSpec],
        joints: &[JointSpec],
        placement: &Placement,
        tuning: &PhysicsTuning,
    ) -> Result<Self, PhysicsError> {
        let mut rig = Self {
            bodies: Vec::with_capacity(parts.len()),
            joints: Vec::with_capacity(joints.len()),
        };
        if let Err(err) = rig.populate(world, parts, joints, placement, tuning) {
            rig.teardown(world);
            return Err(err);
        }
        Ok(rig)
    }

    fn populate(
        &mut self,
        world: &mut DynamicsWorld,
        parts: &[PartSpec],
        joints: &[JointSpec],
        placement: &Placement,
        tuning: &PhysicsTuning,
    ) -> Result<(), PhysicsError> {
        let Placement {
            base,
            rotation,
            impact,
            group,
            collider_type,
        } = *placement;
        for part in parts {
            let velocity = impact.scaled(part.impulse_scale);
            let desc = BodyDesc::dynamic(part.mass, part.half_extents)
                .with_pose(base + rotation * part.offset, rotation)
                .with_velocity(velocity.linear, velocity.angular)
                .with_material(tuning.friction, tuning.restitution)
                .with_damping(tuning.linear_damping, tuning.angular_damping)
                .with_activation(Activation::NeverSleep)
                .with_type(collider_type)
                .in_group(group);
            self.bodies.push(world.add_body(&desc)?);
        }
        for spec in joints {
            let body1 = *self.bodies.get(spec.parent).ok_or(PhysicsError::UnknownBody)?;
            let body2 = *self.bodies.get(spec.child).ok_or(PhysicsError::UnknownBody)?;
            let desc = JointDesc {
                body1,
                body2,
                anchor: base + rotation * spec.pivot,
                axis: rotation * spec.axis,
                reference: rotation * spec.reference,
                kind: spec.kind,
            };
            self.joints.push(world.add_joint(&desc)?);
        }
        Ok(())
    }

    /// Removes every body; joints go with them.
    pub(crate) fn teardown(&self, world: &mut DynamicsWorld) {
        for body in &self.bodies {
            world.remove_body(*body);
        }
    }

    pub(crate) fn set_frozen(&self, world: &mut DynamicsWorld, frozen: bool) {
        for body in &self.bodies {
            world.set_frozen(*body, frozen);
        }
    }

    pub(crate) fn pose(&self, world: &DynamicsWorld, slot: usize) -> Option<BodyPose> {
        let handle = self.bodies.get(slot)?;
        world.body(*handle).map(BodyPose::of)
    }

    pub(crate) fn slot_of(&self, handle: BodyHandle) -> Option<usize> {
        self.bodies.iter().position(|body| *body == handle)
    }
}
