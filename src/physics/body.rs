//! Rigid bodies, shapes and the collider classification used for event
//! routing.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::PhysicsError;

/// Classification attached to every body so contacts can be routed to the
/// right sound or event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColliderType {
    /// The ground plane.
    Ground,
    /// Lamp post.
    StreetLight,
    /// Recycling bin.
    RecycleBin,
    /// A car.
    Car,
    /// A pedestrian or pedestrian ragdoll part.
    Pedestrian,
    /// Bench.
    Bench,
    /// Building front.
    Building,
    /// Tree.
    Tree,
    /// Anything else, including ragdoll parts.
    Generic,
}

impl ColliderType {
    /// Minimum contact impulse that counts as an audible impact.
    #[must_use]
    pub const fn impact_threshold(self) -> f32 {
        match self {
            Self::Ground => 4.0,
            Self::StreetLight => 2.5,
            Self::RecycleBin | Self::Car | Self::Bench | Self::Generic => 3.0,
            Self::Pedestrian => 2.0,
            Self::Building => 5.0,
            Self::Tree => 3.5,
        }
    }
}

/// Collision geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// Oriented box given by its half extents.
    Cuboid {
        /// Half size along each local axis.
        half_extents: Vec3,
    },
    /// Upright cylinder centred on the body position. Static bodies only.
    Cylinder {
        /// Radius in metres.
        radius: f32,
        /// Half the height in metres.
        half_height: f32,
    },
    /// Horizontal half-space whose surface sits at the body's height.
    /// Static bodies only.
    Plane,
}

impl ColliderShape {
    /// Convenience constructor for a box.
    #[must_use]
    pub const fn cuboid(half_extents: Vec3) -> Self {
        Self::Cuboid { half_extents }
    }

    pub(crate) fn validate(&self) -> Result<(), PhysicsError> {
        let ok = match *self {
            Self::Cuboid { half_extents } => {
                half_extents.is_finite() && half_extents.min_element() > 0.0
            }
            Self::Cylinder {
                radius,
                half_height,
            } => radius.is_finite() && half_height.is_finite() && radius > 0.0 && half_height > 0.0,
            Self::Plane => true,
        };
        if ok {
            Ok(())
        } else {
            Err(PhysicsError::InvalidExtents(*self))
        }
    }

    /// Radius of a sphere enclosing the shape; infinite for a plane.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Self::Cuboid { half_extents } => half_extents.length(),
            Self::Cylinder {
                radius,
                half_height,
            } => radius.hypot(half_height),
            Self::Plane => f32::INFINITY,
        }
    }

    /// Radius of the sphere standing in for this shape in body-body contacts.
    pub(crate) fn proxy_radius(&self) -> f32 {
        match *self {
            Self::Cuboid { half_extents } => {
                (half_extents.x + half_extents.y + half_extents.z) / 3.0
            }
            Self::Cylinder { radius, .. } => radius,
            Self::Plane => 0.0,
        }
    }
}

/// Whether a resting body may be put to sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// Sleeps after resting long enough.
    #[default]
    CanSleep,
    /// Always simulated.
    NeverSleep,
}

/// Construction parameters for a body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    /// Kilograms; zero makes the body static.
    pub mass: f32,
    /// Collision geometry.
    pub shape: ColliderShape,
    /// Initial centre of mass.
    pub position: Vec3,
    /// Initial orientation.
    pub rotation: Quat,
    /// Initial velocity, m/s.
    pub linear_velocity: Vec3,
    /// Initial spin, rad/s.
    pub angular_velocity: Vec3,
    /// Friction coefficient.
    pub friction: f32,
    /// Bounce coefficient in [0, 1].
    pub restitution: f32,
    /// Fraction of linear velocity lost per second.
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second.
    pub angular_damping: f32,
    /// Sleep policy.
    pub activation: Activation,
    /// Classification reported in contacts.
    pub collider_type: ColliderType,
    /// Bodies sharing a non-zero group never collide with each other.
    pub group: u32,
}

impl BodyDesc {
    /// A dynamic box of the given mass.
    #[must_use]
    pub fn dynamic(mass: f32, half_extents: Vec3) -> Self {
        Self {
            mass,
            shape: ColliderShape::cuboid(half_extents),
            ..Self::fixed(ColliderShape::cuboid(half_extents), ColliderType::Generic)
        }
    }

    /// A static body of any shape.
    #[must_use]
    pub const fn fixed(shape: ColliderShape, collider_type: ColliderType) -> Self {
        Self {
            mass: 0.0,
            shape,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            friction: 0.6,
            restitution: 0.1,
            linear_damping: 0.0,
            angular_damping: 0.0,
            activation: Activation::CanSleep,
            collider_type,
            group: 0,
        }
    }

    /// Sets the initial pose.
    #[must_use]
    pub const fn with_pose(mut self, position: Vec3, rotation: Quat) -> Self {
        self.position = position;
        self.rotation = rotation;
        self
    }

    /// Sets the initial linear and angular velocity.
    #[must_use]
    pub const fn with_velocity(mut self, linear: Vec3, angular: Vec3) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }

    /// Sets friction and restitution.
    #[must_use]
    pub const fn with_material(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }

    /// Sets linear and angular damping.
    #[must_use]
    pub const fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Sets the sleep policy.
    #[must_use]
    pub const fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Sets the collider classification.
    #[must_use]
    pub const fn with_type(mut self, collider_type: ColliderType) -> Self {
        self.collider_type = collider_type;
        self
    }

    /// Puts the body in a non-colliding group; zero means none.
    #[must_use]
    pub const fn in_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }
}

/// A simulated body.
///
/// Static bodies have zero inverse mass. A dynamic body can additionally be
/// frozen, which removes it from integration and makes the solver treat it
/// as static while keeping its pose.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) prev_position: Vec3,
    pub(crate) prev_rotation: Quat,
    pub(crate) linear_velocity: Vec3,
    pub(crate) angular_velocity: Vec3,
    pub(crate) inv_mass: f32,
    pub(crate) inv_inertia_local: Vec3,
    pub(crate) shape: ColliderShape,
    pub(crate) friction: f32,
    pub(crate) restitution: f32,
    pub(crate) linear_damping: f32,
    pub(crate) angular_damping: f32,
    pub(crate) activation: Activation,
    pub(crate) collider_type: ColliderType,
    pub(crate) group: u32,
    pub(crate) frozen: bool,
    pub(crate) sleeping: bool,
    pub(crate) sleep_timer: f32,
}

impl RigidBody {
    pub(crate) fn from_desc(desc: &BodyDesc) -> Result<Self, PhysicsError> {
        if !desc.mass.is_finite() || desc.mass < 0.0 {
            return Err(PhysicsError::InvalidMass(desc.mass));
        }
        desc.shape.validate()?;
        if !desc.position.is_finite() || !desc.rotation.is_finite() {
            return Err(PhysicsError::NonFinitePose);
        }
        let (inv_mass, inv_inertia_local) = if desc.mass > 0.0 {
            let ColliderShape::Cuboid { half_extents } = desc.shape else {
                return Err(PhysicsError::UnsupportedDynamicShape(desc.shape));
            };
            (1.0 / desc.mass, box_inverse_inertia(desc.mass, half_extents))
        } else {
            (0.0, Vec3::ZERO)
        };
        let rotation = desc.rotation.normalize();
        let dynamic = inv_mass > 0.0;
        Ok(Self {
            position: desc.position,
            rotation,
            prev_position: desc.position,
            prev_rotation: rotation,
            linear_velocity: if dynamic { desc.linear_velocity } else { Vec3::ZERO },
            angular_velocity: if dynamic { desc.angular_velocity } else { Vec3::ZERO },
            inv_mass,
            inv_inertia_local,
            shape: desc.shape,
            friction: desc.friction.max(0.0),
            restitution: desc.restitution.clamp(0.0, 1.0),
            linear_damping: desc.linear_damping.max(0.0),
            angular_damping: desc.angular_damping.max(0.0),
            activation: desc.activation,
            collider_type: desc.collider_type,
            group: desc.group,
            frozen: false,
            sleeping: false,
            sleep_timer: 0.0,
        })
    }

    /// Centre of mass in world space.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Orientation.
    #[must_use]
    pub const fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Velocity, m/s.
    #[must_use]
    pub const fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    /// Spin, rad/s.
    #[must_use]
    pub const fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    /// Mass in kilograms; zero for static bodies.
    #[must_use]
    pub const fn mass(&self) -> f32 {
        if self.inv_mass > 0.0 {
            1.0 / self.inv_mass
        } else {
            0.0
        }
    }

    /// Collision geometry.
    #[must_use]
    pub const fn shape(&self) -> ColliderShape {
        self.shape
    }

    /// Classification reported in contacts.
    #[must_use]
    pub const fn collider_type(&self) -> ColliderType {
        self.collider_type
    }

    /// Non-colliding group; zero means none.
    #[must_use]
    pub const fn group(&self) -> u32 {
        self.group
    }

    /// True for zero-mass bodies.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.inv_mass <= 0.0
    }

    /// Whether the body is held in place.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether the body is resting and skipped by the solver.
    #[must_use]
    pub const fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Whether the solver moves this body this substep.
    pub(crate) const fn is_simulated(&self) -> bool {
        self.inv_mass > 0.0 && !self.frozen && !self.sleeping
    }

    /// Converts a body-local point to world space.
    #[must_use]
    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Converts a world point to body-local space.
    #[must_use]
    pub fn world_to_local(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }

    pub(crate) const fn wake(&mut self) {
        self.sleeping = false;
        self.sleep_timer = 0.0;
    }

    /// Applies the world-space inverse inertia tensor to `v`.
    pub(crate) fn inv_inertia_world(&self, v: Vec3) -> Vec3 {
        if !self.is_simulated() {
            return Vec3::ZERO;
        }
        self.rotation * (self.inv_inertia_local * (self.rotation.inverse() * v))
    }

    /// Generalised inverse mass for a correction along `n` applied at the
    /// world-space arm `r`.
    pub(crate) fn generalized_inverse_mass(&self, r: Vec3, n: Vec3) -> f32 {
        if !self.is_simulated() {
            return 0.0;
        }
        let rn = r.cross(n);
        self.inv_mass + rn.dot(self.inv_inertia_world(rn))
    }

    /// Inverse mass seen by a pure rotation about `axis`.
    pub(crate) fn angular_inverse_mass(&self, axis: Vec3) -> f32 {
        if !self.is_simulated() {
            return 0.0;
        }
        axis.dot(self.inv_inertia_world(axis))
    }

    /// Shifts the body by the positional impulse `p` applied at arm `r`.
    pub(crate) fn apply_positional(&mut self, p: Vec3, r: Vec3) {
        if !self.is_simulated() {
            return;
        }
        self.position += p * self.inv_mass;
        let dtheta = self.inv_inertia_world(r.cross(p));
        self.rotation = integrate_rotation(self.rotation, dtheta);
    }

    /// Rotates the body by the angular correction `dtheta`, already scaled
    /// by the inverse inertia.
    pub(crate) fn apply_rotation(&mut self, dtheta: Vec3) {
        if !self.is_simulated() {
            return;
        }
        self.rotation = integrate_rotation(self.rotation, dtheta);
    }

    /// Changes velocities by the impulse `p` applied at arm `r`.
    pub(crate) fn apply_impulse(&mut self, p: Vec3, r: Vec3) {
        if !self.is_simulated() {
            return;
        }
        self.linear_velocity += p * self.inv_mass;
        self.angular_velocity += self.inv_inertia_world(r.cross(p));
    }

    /// Velocity of the material point at world-space arm `r`.
    pub(crate) fn point_velocity(&self, r: Vec3) -> Vec3 {
        if !self.is_simulated() {
            return Vec3::ZERO;
        }
        self.linear_velocity + self.angular_velocity.cross(r)
    }

    /// Explicit integration step; stores the pose for velocity derivation.
    pub(crate) fn integrate(&mut self, h: f32, gravity: Vec3) {
        self.prev_position = self.position;
        self.prev_rotation = self.rotation;
        if !self.is_simulated() {
            return;
        }
        self.linear_velocity += gravity * h;
        self.linear_velocity /= h.mul_add(self.linear_damping, 1.0);
        self.angular_velocity /= h.mul_add(self.angular_damping, 1.0);
        self.position += self.linear_velocity * h;
        self.rotation = integrate_rotation(self.rotation, self.angular_velocity * h);
    }

    /// Derives velocities from the positional change of this substep.
    pub(crate) fn derive_velocities(&mut self, h: f32) {
        if !self.is_simulated() {
            return;
        }
        self.linear_velocity = (self.position - self.prev_position) / h;
        let dq = self.rotation * self.prev_rotation.inverse();
        let omega = Vec3::new(dq.x, dq.y, dq.z) * (2.0 / h);
        self.angular_velocity = if dq.w >= 0.0 { omega } else { -omega };
    }

    /// Clamps speeds; returns true if anything was clamped.
    pub(crate) fn clamp_velocities(&mut self, max_linear: f32, max_angular: f32) -> bool {
        let mut clamped = false;
        if self.linear_velocity.length_squared() > max_linear * max_linear {
            self.linear_velocity = self.linear_velocity.clamp_length_max(max_linear);
            clamped = true;
        }
        if self.angular_velocity.length_squared() > max_angular * max_angular {
            self.angular_velocity = self.angular_velocity.clamp_length_max(max_angular);
            clamped = true;
        }
        clamped
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.rotation.is_finite()
            && self.linear_velocity.is_finite()
            && self.angular_velocity.is_finite()
    }

    /// Restores the pre-substep pose and stops the body.
    pub(crate) fn roll_back(&mut self) {
        self.position = if self.prev_position.is_finite() {
            self.prev_position
        } else {
            Vec3::ZERO
        };
        self.rotation = if self.prev_rotation.is_finite() {
            self.prev_rotation
        } else {
            Quat::IDENTITY
        };
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    /// Advances the sleep timer after a substep of length `h`.
    pub(crate) fn update_sleep(&mut self, h: f32, linear: f32, angular: f32, delay: f32) {
        if !self.is_simulated() || self.activation == Activation::NeverSleep {
            return;
        }
        let resting = self.linear_velocity.length_squared() < linear * linear
            && self.angular_velocity.length_squared() < angular * angular;
        if resting {
            self.sleep_timer += h;
            if self.sleep_timer >= delay {
                self.sleeping = true;
                self.linear_velocity = Vec3::ZERO;
                self.angular_velocity = Vec3::ZERO;
            }
        } else {
            self.sleep_timer = 0.0;
        }
    }

    /// Body-local contact sample points of a box: corners, centre and face
    /// centres. `None` for other shapes.
    pub(crate) fn box_samples(&self) -> Option<[Vec3; 15]> {
        let ColliderShape::Cuboid { half_extents: h } = self.shape else {
            return None;
        };
        Some([
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::ZERO,
            Vec3::new(h.x, 0.0, 0.0),
            Vec3::new(-h.x, 0.0, 0.0),
            Vec3::new(0.0, h.y, 0.0),
            Vec3::new(0.0, -h.y, 0.0),
            Vec3::new(0.0, 0.0, h.z),
            Vec3::new(0.0, 0.0, -h.z),
        ])
    }
}

/// Diagonal inverse inertia of a solid box.
fn box_inverse_inertia(mass: f32, h: Vec3) -> Vec3 {
    let third = mass / 3.0;
    let inertia = Vec3::new(
        third * h.y.mul_add(h.y, h.z * h.z),
        third * h.x.mul_add(h.x, h.z * h.z),
        third * h.x.mul_add(h.x, h.y * h.y),
    );
    Vec3::ONE / inertia
}

/// Adds a small rotation vector to an orientation.
pub(crate) fn integrate_rotation(rotation: Quat, dtheta: Vec3) -> Quat {
    let spin = Quat::from_xyzw(dtheta.x, dtheta.y, dtheta.z, 0.0) * rotation;
    (rotation + spin * 0.5).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(-1.0)]
    #[case(f32::NAN)]
    fn negative_or_nan_mass_is_rejected(#[case] mass: f32) {
        let desc = BodyDesc::dynamic(mass, Vec3::splat(0.1));
        assert!(matches!(
            RigidBody::from_desc(&desc),
            Err(PhysicsError::InvalidMass(_))
        ));
    }

    #[rstest]
    #[case(Vec3::new(0.0, 0.1, 0.1))]
    #[case(Vec3::new(0.1, -0.1, 0.1))]
    #[case(Vec3::new(0.1, 0.1, f32::INFINITY))]
    fn degenerate_extents_are_rejected(#[case] half_extents: Vec3) {
        let desc = BodyDesc::dynamic(1.0, half_extents);
        assert!(matches!(
            RigidBody::from_desc(&desc),
            Err(PhysicsError::InvalidExtents(_))
        ));
    }

    #[rstest]
    fn dynamic_cylinder_is_unsupported() {
        let mut desc = BodyDesc::fixed(
            ColliderShape::Cylinder {
                radius: 0.2,
                half_height: 1.0,
            },
            ColliderType::StreetLight,
        );
        desc.mass = 3.0;
        assert!(matches!(
            RigidBody::from_desc(&desc),
            Err(PhysicsError::UnsupportedDynamicShape(_))
        ));
    }

    #[rstest]
    fn cube_inertia_is_isotropic() {
        let inv = box_inverse_inertia(6.0, Vec3::splat(0.5));
        // I = m/3 * (0.25 + 0.25) = 1.0
        assert_relative_eq!(inv, Vec3::ONE, epsilon = 1e-6);
    }

    #[rstest]
    fn derived_velocity_matches_motion() {
        let desc = BodyDesc::dynamic(1.0, Vec3::splat(0.1)).with_velocity(Vec3::X, Vec3::Y);
        let mut body = RigidBody::from_desc(&desc).expect("valid body");
        let h = 1.0 / 480.0;
        body.integrate(h, Vec3::ZERO);
        body.derive_velocities(h);
        assert_relative_eq!(body.linear_velocity.x, 1.0, epsilon = 1e-3);
        assert_relative_eq!(body.angular_velocity.y, 1.0, epsilon = 1e-2);
    }

    #[rstest]
    fn static_body_ignores_impulses() {
        let desc = BodyDesc::fixed(ColliderShape::Plane, ColliderType::Ground);
        let mut body = RigidBody::from_desc(&desc).expect("valid plane");
        body.apply_impulse(Vec3::Y * 10.0, Vec3::X);
        body.apply_positional(Vec3::Y, Vec3::ZERO);
        assert_eq!(body.position, Vec3::ZERO);
        assert_eq!(body.linear_velocity, Vec3::ZERO);
        assert_eq!(body.generalized_inverse_mass(Vec3::X, Vec3::Y), 0.0);
    }

    #[rstest]
    fn roll_back_restores_previous_pose() {
        let desc = BodyDesc::dynamic(1.0, Vec3::splat(0.1)).with_velocity(Vec3::X, Vec3::ZERO);
        let mut body = RigidBody::from_desc(&desc).expect("valid body");
        body.integrate(0.01, Vec3::ZERO);
        body.position = Vec3::NAN;
        assert!(!body.is_finite());
        body.roll_back();
        assert!(body.is_finite());
        assert_eq!(body.position, Vec3::ZERO);
    }

    #[rstest]
    fn never_sleep_bodies_stay_awake() {
        let desc = BodyDesc::dynamic(1.0, Vec3::splat(0.1)).with_activation(Activation::NeverSleep);
        let mut body = RigidBody::from_desc(&desc).expect("valid body");
        for _ in 0..100 {
            body.update_sleep(0.1, 0.05, 0.05, 0.5);
        }
        assert!(!body.is_sleeping());
    }

    #[rstest]
    fn resting_bodies_fall_asleep() {
        let desc = BodyDesc::dynamic(1.0, Vec3::splat(0.1));
        let mut body = RigidBody::from_desc(&desc).expect("valid body");
        for _ in 0..10 {
            body.update_sleep(0.1, 0.05, 0.05, 0.5);
        }
        assert!(body.is_sleeping());
    }

    #[rstest]
    #[case(ColliderType::Ground, 4.0)]
    #[case(ColliderType::Pedestrian, 2.0)]
    #[case(ColliderType::Building, 5.0)]
    fn thresholds_are_tuned_per_class(#[case] kind: ColliderType, #[case] threshold: f32) {
        assert_relative_eq!(kind.impact_threshold(), threshold);
    }
}
