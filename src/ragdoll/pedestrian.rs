//! Six-segment ragdolls for knocked-down pedestrians.

use bevy_ecs::entity::Entity;
use glam::Vec3;

use super::impulse::stumble_impact;
use super::rig::{Placement, Rig};
use super::skeleton::{JointSpec, PartSpec, PedestrianJoint, PedestrianPart};
use crate::config::PhysicsTuning;
use crate::physics::{BodyHandle, ColliderType, DynamicsWorld, PhysicsError};
use crate::vector_math::yaw_rotation;

/// Height of a pedestrian's hips above the ground.
pub(crate) const PEDESTRIAN_HIP_HEIGHT: f32 = 0.86;

/// Pedestrian groups start after the player's.
const FIRST_GROUP: u32 = 2;

#[derive(Debug, Clone)]
pub(crate) struct PedestrianRagdoll {
    pub(crate) rig: Rig,
    pub(crate) entity: Option<Entity>,
}

impl PedestrianRagdoll {
    pub(crate) fn build(
        world: &mut DynamicsWorld,
        slot: usize,
        knock: &Knock,
        tuning: &PhysicsTuning,
    ) -> Result<Self, PhysicsError> {
        let parts: Vec<PartSpec> = PedestrianPart::ALL.iter().map(|part| part.spec()).collect();
        let joints: Vec<JointSpec> = PedestrianJoint::ALL
            .iter()
            .map(|joint| joint.spec())
            .collect();
        let group = u32::try_from(slot)
            .unwrap_or(u32::MAX - FIRST_GROUP)
            .saturating_add(FIRST_GROUP);
        let placement = Placement {
            base: knock.position + Vec3::Y * PEDESTRIAN_HIP_HEIGHT,
            rotation: yaw_rotation(knock.yaw),
            impact: stumble_impact(knock.impact_speed, knock.impact_direction),
            group,
            collider_type: ColliderType::Pedestrian,
        };
        let rig = Rig::assemble(world, &parts, &joints, &placement, tuning)?;
        Ok(Self {
            rig,
            entity: knock.entity,
        })
    }

    pub(crate) fn owns(&self, handle: BodyHandle) -> bool {
        self.rig.slot_of(handle).is_some()
    }
}

/// Parameters for knocking a pedestrian over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knock {
    /// Ground position of the pedestrian.
    pub position: Vec3,
    /// Pedestrian heading, radians.
    pub yaw: f32,
    /// Speed of whatever hit them, m/s.
    pub impact_speed: f32,
    /// Direction the hit came from.
    pub impact_direction: Vec3,
    /// Entity the ragdoll stands in for.
    pub entity: Option<Entity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn build_creates_six_parts_and_five_joints() {
        let mut world = DynamicsWorld::default();
        let knock = Knock {
            position: Vec3::new(2.0, 0.0, -5.0),
            yaw: 0.0,
            impact_speed: 6.0,
            impact_direction: Vec3::X,
            entity: None,
        };
        let ragdoll =
            PedestrianRagdoll::build(&mut world, 0, &knock, &PhysicsTuning::default()).expect("builds");
        assert_eq!(ragdoll.rig.bodies.len(), 6);
        assert_eq!(world.joint_count(), 5);
        let torso = world
            .body(ragdoll.rig.bodies[PedestrianPart::Torso.index()])
            .expect("live torso");
        assert!(torso.linear_velocity().x > 0.0);
        assert_eq!(torso.collider_type(), ColliderType::Pedestrian);
    }
}
