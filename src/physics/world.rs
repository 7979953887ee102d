//! The dynamics world: body and joint storage plus the fixed-step solver.

use glam::{Quat, Vec3};
use hashbrown::HashMap;
use log::{debug, warn};

use super::arena::{Arena, RawHandle};
use super::body::{BodyDesc, RigidBody};
use super::contact::{self, Contact};
use super::joint::{Joint, JointDesc};
use super::PhysicsError;
use crate::config::PhysicsTuning;
use crate::constants::{SLEEP_ANGULAR_THRESHOLD, SLEEP_DELAY, SLEEP_LINEAR_THRESHOLD};
use crate::numeric::sanitize_dt;

/// Handle to a body in a [`DynamicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) RawHandle);

/// Handle to a joint in a [`DynamicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointHandle(pub(crate) RawHandle);

/// Strongest contact between a dynamic body and another body during one
/// [`DynamicsWorld::step`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactReport {
    /// The dynamic body.
    pub body: BodyHandle,
    /// What it touched.
    pub other: BodyHandle,
    /// World-space contact point on `other`.
    pub point: Vec3,
    /// Largest normal impulse applied to the pair.
    pub max_impulse: f32,
    /// Largest normal closing speed seen for the pair.
    pub approach_speed: f32,
}

/// Rigid-body world advanced in fixed steps.
#[derive(Debug, Clone)]
pub struct DynamicsWorld {
    bodies: Arena<RigidBody>,
    joints: Arena<Joint>,
    settings: PhysicsTuning,
    gravity: Vec3,
    accumulator: f32,
    contacts: Vec<Contact>,
    reports: Vec<ContactReport>,
    report_index: HashMap<(usize, usize), usize>,
}

impl Default for DynamicsWorld {
    fn default() -> Self {
        Self::new(PhysicsTuning::default())
    }
}

impl DynamicsWorld {
    /// Empty world using `settings`.
    #[must_use]
    pub fn new(settings: PhysicsTuning) -> Self {
        let gravity = Vec3::new(0.0, settings.gravity, 0.0);
        Self {
            bodies: Arena::default(),
            joints: Arena::default(),
            settings,
            gravity,
            accumulator: 0.0,
            contacts: Vec::new(),
            reports: Vec::new(),
            report_index: HashMap::new(),
        }
    }

    /// Solver settings.
    #[must_use]
    pub const fn settings(&self) -> &PhysicsTuning {
        &self.settings
    }

    /// Adds a body.
    ///
    /// # Errors
    /// Rejects negative or non-finite mass, degenerate extents, a non-box
    /// dynamic shape and a non-finite pose.
    pub fn add_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, PhysicsError> {
        let body = RigidBody::from_desc(desc)?;
        Ok(BodyHandle(self.bodies.insert(body)))
    }

    /// Removes a body together with every joint attached to it.
    ///
    /// Returns `false` if the handle was already stale.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        if self.bodies.remove(handle.0).is_none() {
            return false;
        }
        let attached: Vec<RawHandle> = self
            .joints
            .iter()
            .filter(|(_, joint)| joint.body1 == handle || joint.body2 == handle)
            .map(|(raw, _)| raw)
            .collect();
        for raw in attached {
            self.joints.remove(raw);
        }
        true
    }

    /// Connects two bodies.
    ///
    /// # Errors
    /// Fails when either handle is stale, both handles name the same body,
    /// or the axes are degenerate.
    pub fn add_joint(&mut self, desc: &JointDesc) -> Result<JointHandle, PhysicsError> {
        if desc.body1 == desc.body2 {
            return Err(PhysicsError::SelfJoint);
        }
        let b1 = self
            .bodies
            .get(desc.body1.0)
            .ok_or(PhysicsError::UnknownBody)?;
        let b2 = self
            .bodies
            .get(desc.body2.0)
            .ok_or(PhysicsError::UnknownBody)?;
        let axis = desc
            .axis
            .try_normalize()
            .ok_or(PhysicsError::DegenerateAxis)?;
        let reference = (desc.reference - axis * axis.dot(desc.reference))
            .try_normalize()
            .ok_or(PhysicsError::DegenerateAxis)?;
        if !desc.anchor.is_finite() {
            return Err(PhysicsError::NonFinitePose);
        }
        let joint = Joint::new(desc, axis, reference, b1, b2);
        Ok(JointHandle(self.joints.insert(joint)))
    }

    /// Removes a joint; `false` if it was already gone.
    pub fn remove_joint(&mut self, handle: JointHandle) -> bool {
        self.joints.remove(handle.0).is_some()
    }

    /// Live body behind `handle`.
    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.0)
    }

    /// Number of live bodies.
    #[must_use]
    pub const fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live joints.
    #[must_use]
    pub const fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Hinge angle, or swing angle for a cone joint, in radians.
    #[must_use]
    pub fn joint_angle(&self, handle: JointHandle) -> Option<f32> {
        let joint = self.joints.get(handle.0)?;
        let b1 = self.bodies.get(joint.body1.0)?;
        let b2 = self.bodies.get(joint.body2.0)?;
        Some(joint.angle(b1, b2))
    }

    /// Overwrites velocities and wakes the body.
    pub fn set_velocity(&mut self, handle: BodyHandle, linear: Vec3, angular: Vec3) -> bool {
        let Some(body) = self.bodies.get_mut(handle.0) else {
            return false;
        };
        if body.is_static() || !linear.is_finite() || !angular.is_finite() {
            return false;
        }
        body.linear_velocity = linear;
        body.angular_velocity = angular;
        body.wake();
        true
    }

    /// Teleports a body; used to keep static proxies on moving entities.
    pub fn set_pose(&mut self, handle: BodyHandle, position: Vec3, rotation: Quat) -> bool {
        let Some(body) = self.bodies.get_mut(handle.0) else {
            return false;
        };
        if !position.is_finite() || !rotation.is_finite() {
            return false;
        }
        body.position = position;
        body.rotation = rotation.normalize();
        body.prev_position = body.position;
        body.prev_rotation = body.rotation;
        true
    }

    /// Freezes or releases a dynamic body. Frozen bodies keep their pose
    /// and act as static obstacles.
    pub fn set_frozen(&mut self, handle: BodyHandle, frozen: bool) -> bool {
        let Some(body) = self.bodies.get_mut(handle.0) else {
            return false;
        };
        body.frozen = frozen;
        if frozen {
            body.linear_velocity = Vec3::ZERO;
            body.angular_velocity = Vec3::ZERO;
        } else {
            body.wake();
        }
        true
    }

    /// Removes every body and joint.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.joints.clear();
        self.contacts.clear();
        self.reports.clear();
        self.report_index.clear();
        self.accumulator = 0.0;
    }

    /// Advances the world by `dt` seconds of wall time.
    ///
    /// `dt` is clamped to the configured maximum frame time and consumed in
    /// fixed steps, each split into solver substeps. At most
    /// `max_substeps` fixed steps run per call; leftover backlog is dropped.
    /// Returns the contact reports gathered during this call.
    pub fn step(&mut self, dt: f32) -> &[ContactReport] {
        self.reports.clear();
        self.report_index.clear();
        let fixed = self.settings.fixed_timestep;
        self.accumulator += sanitize_dt(dt, self.settings.max_frame_dt);
        let mut steps = 0;
        while self.accumulator >= fixed && steps < self.settings.max_substeps {
            self.fixed_step(fixed);
            self.accumulator -= fixed;
            steps += 1;
        }
        if steps == self.settings.max_substeps {
            self.accumulator = self.accumulator.min(fixed);
        }
        &self.reports
    }

    fn fixed_step(&mut self, fixed: f32) {
        let iterations = self.settings.solver_iterations.max(1);
        let h = fixed / iterations as f32;
        for _ in 0..iterations {
            self.substep(h);
        }
    }

    fn substep(&mut self, h: f32) {
        let gravity = self.gravity;
        for body in self.bodies.iter_mut() {
            body.integrate(h, gravity);
        }

        let wake = contact::detect(&self.bodies, &mut self.contacts);
        for index in wake {
            if let Some(body) = self.bodies.at_mut(index) {
                body.wake();
            }
        }

        for contact in &mut self.contacts {
            if let Some((b1, b2)) = self.bodies.pair_mut(contact.body, contact.other) {
                contact.solve_position(b1, b2);
            }
        }
        self.solve_joints();

        for body in self.bodies.iter_mut() {
            body.derive_velocities(h);
        }

        let rest_speed = 2.0 * gravity.length() * h;
        for index in 0..self.contacts.len() {
            let Some(&contact) = self.contacts.get(index) else {
                continue;
            };
            let Some((b1, b2)) = self.bodies.pair_mut(contact.body, contact.other) else {
                continue;
            };
            let impulse = contact.solve_velocity(b1, b2, h, rest_speed);
            if impulse > 0.0 {
                let point = contact.point(b1, b2);
                self.record(&contact, point, impulse);
            }
        }

        self.finish_substep(h);
    }

    fn solve_joints(&mut self) {
        let capacity = self.joints.capacity();
        for index in 0..capacity {
            let Some(joint) = self.joints.at(index) else {
                continue;
            };
            let (i1, i2) = (joint.body1.0.index as usize, joint.body2.0.index as usize);
            if let Some((b1, b2)) = self.bodies.pair_mut(i1, i2) {
                joint.solve(b1, b2);
            }
        }
    }

    fn finish_substep(&mut self, h: f32) {
        let max_linear = self.settings.max_linear_speed;
        let max_angular = self.settings.max_angular_speed;
        for body in self.bodies.iter_mut() {
            if !body.is_simulated() {
                continue;
            }
            if !body.is_finite() {
                warn!(
                    "non-finite body state ({:?}); rolling back",
                    body.collider_type()
                );
                body.roll_back();
                continue;
            }
            if body.clamp_velocities(max_linear, max_angular) {
                debug!("clamped velocity of {:?} body", body.collider_type());
            }
            body.update_sleep(
                h,
                SLEEP_LINEAR_THRESHOLD,
                SLEEP_ANGULAR_THRESHOLD,
                SLEEP_DELAY,
            );
        }
    }

    fn record(&mut self, contact: &Contact, point: Vec3, impulse: f32) {
        let key = (contact.body, contact.other);
        if let Some(&slot) = self.report_index.get(&key) {
            if let Some(report) = self.reports.get_mut(slot) {
                if impulse > report.max_impulse {
                    report.max_impulse = impulse;
                    report.point = point;
                }
                report.approach_speed = report.approach_speed.max(contact.approach_speed);
            }
            return;
        }
        let (Some(body), Some(other)) = (
            self.bodies.handle_at(contact.body),
            self.bodies.handle_at(contact.other),
        ) else {
            return;
        };
        self.report_index.insert(key, self.reports.len());
        self.reports.push(ContactReport {
            body: BodyHandle(body),
            other: BodyHandle(other),
            point,
            max_impulse: impulse,
            approach_speed: contact.approach_speed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::{Activation, ColliderShape, ColliderType};
    use crate::physics::joint::JointKind;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn world() -> DynamicsWorld {
        let mut world = DynamicsWorld::default();
        world
            .add_body(&BodyDesc::fixed(ColliderShape::Plane, ColliderType::Ground))
            .expect("ground plane");
        world
    }

    fn crate_at(world: &mut DynamicsWorld, y: f32) -> BodyHandle {
        world
            .add_body(
                &BodyDesc::dynamic(10.0, Vec3::splat(0.25))
                    .with_pose(Vec3::new(0.0, y, 0.0), Quat::IDENTITY)
                    .with_activation(Activation::NeverSleep),
            )
            .expect("valid box")
    }

    #[rstest]
    fn box_comes_to_rest_on_ground(mut world: DynamicsWorld) {
        let handle = crate_at(&mut world, 2.0);
        for _ in 0..240 {
            world.step(1.0 / 60.0);
        }
        let body = world.body(handle).expect("live body");
        assert_relative_eq!(body.position().y, 0.25, epsilon = 0.03);
        assert!(body.linear_velocity().length() < 0.2);
    }

    #[rstest]
    fn landing_reports_ground_impact(mut world: DynamicsWorld) {
        let handle = crate_at(&mut world, 1.5);
        let mut strongest = 0.0_f32;
        for _ in 0..120 {
            for report in world.step(1.0 / 60.0) {
                if report.body == handle {
                    strongest = strongest.max(report.max_impulse);
                }
            }
        }
        assert!(strongest > ColliderType::Ground.impact_threshold());
    }

    #[rstest]
    fn huge_dt_is_clamped(mut world: DynamicsWorld) {
        let handle = crate_at(&mut world, 10.0);
        world.step(5.0);
        let body = world.body(handle).expect("live body");
        // One clamped frame is at most 1/30 s of free fall.
        assert!(body.position().y > 10.0 - 0.5);
    }

    #[rstest]
    fn removing_body_removes_its_joints(mut world: DynamicsWorld) {
        let a = crate_at(&mut world, 2.0);
        let b = crate_at(&mut world, 1.4);
        world
            .add_joint(&JointDesc {
                body1: a,
                body2: b,
                anchor: Vec3::new(0.0, 1.7, 0.0),
                axis: Vec3::X,
                reference: Vec3::NEG_Y,
                kind: JointKind::Hinge {
                    low: 0.0,
                    high: 2.0,
                },
            })
            .expect("valid joint");
        assert_eq!(world.joint_count(), 1);
        assert!(world.remove_body(b));
        assert_eq!(world.joint_count(), 0);
        assert!(!world.remove_body(b));
    }

    #[rstest]
    fn joint_to_stale_body_is_rejected(mut world: DynamicsWorld) {
        let a = crate_at(&mut world, 2.0);
        let b = crate_at(&mut world, 3.0);
        world.remove_body(b);
        let result = world.add_joint(&JointDesc {
            body1: a,
            body2: b,
            anchor: Vec3::ZERO,
            axis: Vec3::Y,
            reference: Vec3::X,
            kind: JointKind::ConeTwist {
                swing1: 1.0,
                swing2: 1.0,
                twist: 1.0,
            },
        });
        assert!(matches!(result, Err(PhysicsError::UnknownBody)));
    }

    #[rstest]
    fn frozen_body_holds_pose(mut world: DynamicsWorld) {
        let handle = crate_at(&mut world, 3.0);
        world.step(1.0 / 60.0);
        assert!(world.set_frozen(handle, true));
        let before = world.body(handle).expect("live body").position();
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        assert_eq!(world.body(handle).expect("live body").position(), before);
    }

    #[rstest]
    fn nan_velocity_is_refused(mut world: DynamicsWorld) {
        let handle = crate_at(&mut world, 3.0);
        assert!(!world.set_velocity(handle, Vec3::NAN, Vec3::ZERO));
    }
}
