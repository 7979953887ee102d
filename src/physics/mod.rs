//! Minimal rigid-body engine for ragdolls.
//!
//! A position-based solver with box bodies, a handful of static collider
//! shapes and two joint types. The interface is deliberately small: create
//! bodies and joints, step, read poses and per-step contact reports.
//!
//! ```
//! use glam::{Quat, Vec3};
//! use monowheel::physics::{BodyDesc, ColliderShape, ColliderType, DynamicsWorld};
//!
//! let mut world = DynamicsWorld::default();
//! world
//!     .add_body(&BodyDesc::fixed(ColliderShape::Plane, ColliderType::Ground))
//!     .expect("ground");
//! let crate_body = world
//!     .add_body(
//!         &BodyDesc::dynamic(5.0, Vec3::splat(0.2))
//!             .with_pose(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY),
//!     )
//!     .expect("box");
//! world.step(1.0 / 60.0);
//! assert!(world.body(crate_body).expect("live").position().y < 1.0);
//! ```

mod arena;
mod body;
mod contact;
mod joint;
mod world;

use thiserror::Error;

pub use body::{Activation, BodyDesc, ColliderShape, ColliderType, RigidBody};
pub use joint::{JointDesc, JointKind};
pub use world::{BodyHandle, ContactReport, DynamicsWorld, JointHandle};

/// Rejected body or joint construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Mass was negative or not finite.
    #[error("mass must be finite and non-negative, got {0}")]
    InvalidMass(f32),
    /// A shape dimension was zero, negative or not finite.
    #[error("shape extents must be finite and positive: {0:?}")]
    InvalidExtents(ColliderShape),
    /// Only boxes can be dynamic.
    #[error("dynamic bodies must be boxes, got {0:?}")]
    UnsupportedDynamicShape(ColliderShape),
    /// Position, rotation or anchor was not finite.
    #[error("body pose must be finite")]
    NonFinitePose,
    /// A handle did not resolve to a live body.
    #[error("joint references a body that does not exist")]
    UnknownBody,
    /// Both ends of a joint named the same body.
    #[error("a joint cannot connect a body to itself")]
    SelfJoint,
    /// Joint axis or reference was zero or the two were parallel.
    #[error("joint axis and reference must be non-zero and not parallel")]
    DegenerateAxis,
}
