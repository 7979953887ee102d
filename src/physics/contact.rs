//! Contact generation and resolution.
//!
//! Dynamic boxes are sampled at their corners, centre and face centres
//! against static shapes (ground plane, boxes, upright cylinders) and
//! frozen bodies. Dynamic bodies of different groups collide through sphere
//! proxies. Contacts are regenerated every substep.

use glam::Vec3;

use super::arena::Arena;
use super::body::{ColliderShape, RigidBody};

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ContactKind {
    /// Point on `body` pressed into a fixed surface of `other`.
    Surface { local1: Vec3, local2: Vec3 },
    /// Two dynamic bodies approximated as spheres.
    Spheres { radius_sum: f32 },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Contact {
    pub(crate) body: usize,
    pub(crate) other: usize,
    pub(crate) kind: ContactKind,
    /// Points from `other` into `body`.
    pub(crate) normal: Vec3,
    pub(crate) lambda: f32,
    /// Normal closing speed before the position solve; positive when the
    /// bodies approach.
    pub(crate) approach_speed: f32,
    pub(crate) friction: f32,
    pub(crate) restitution: f32,
}

impl Contact {
    fn arms(&self, b1: &RigidBody, b2: &RigidBody) -> (Vec3, Vec3) {
        match self.kind {
            ContactKind::Surface { local1, local2 } => (b1.rotation * local1, b2.rotation * local2),
            ContactKind::Spheres { .. } => (Vec3::ZERO, Vec3::ZERO),
        }
    }

    /// World position of the contact on the other body.
    pub(crate) fn point(&self, b1: &RigidBody, b2: &RigidBody) -> Vec3 {
        match self.kind {
            ContactKind::Surface { local2, .. } => b2.local_to_world(local2),
            ContactKind::Spheres { radius_sum } => {
                let half = radius_sum * 0.5;
                b1.position - self.normal * half
            }
        }
    }

    /// Pushes the bodies apart along the contact normal.
    pub(crate) fn solve_position(&mut self, b1: &mut RigidBody, b2: &mut RigidBody) {
        let (r1, r2) = self.arms(b1, b2);
        let depth = match self.kind {
            ContactKind::Surface { .. } => {
                let p1 = b1.position + r1;
                let p2 = b2.position + r2;
                (p2 - p1).dot(self.normal)
            }
            ContactKind::Spheres { radius_sum } => {
                let delta = b1.position - b2.position;
                let distance = delta.length();
                if distance < EPSILON {
                    return;
                }
                self.normal = delta / distance;
                radius_sum - distance
            }
        };
        if depth <= 0.0 {
            return;
        }
        let n = self.normal;
        let w = b1.generalized_inverse_mass(r1, n) + b2.generalized_inverse_mass(r2, n);
        if w < EPSILON {
            return;
        }
        let dlambda = depth / w;
        self.lambda += dlambda;
        let p = n * dlambda;
        b1.apply_positional(p, r1);
        b2.apply_positional(-p, r2);
    }

    /// Applies restitution and dynamic friction; returns the impulse
    /// estimate used for impact reporting.
    pub(crate) fn solve_velocity(
        &self,
        b1: &mut RigidBody,
        b2: &mut RigidBody,
        h: f32,
        rest_speed: f32,
    ) -> f32 {
        if self.lambda <= 0.0 {
            return 0.0;
        }
        let (r1, r2) = self.arms(b1, b2);
        let n = self.normal;
        let relative = b1.point_velocity(r1) - b2.point_velocity(r2);
        let vn = n.dot(relative);
        let vt = relative - n * vn;

        let mut dv = Vec3::ZERO;
        let vt_len = vt.length();
        if vt_len > EPSILON {
            let wn = b1.generalized_inverse_mass(r1, n) + b2.generalized_inverse_mass(r2, n);
            let limit = self.friction * self.lambda * wn / h;
            dv -= vt / vt_len * limit.min(vt_len);
        }
        let restitution = if self.approach_speed <= rest_speed {
            0.0
        } else {
            self.restitution
        };
        dv += n * (-vn + (restitution * self.approach_speed).max(0.0));

        let base = self.lambda / h;
        let len = dv.length();
        if len < EPSILON {
            return base;
        }
        let dir = dv / len;
        let w = b1.generalized_inverse_mass(r1, dir) + b2.generalized_inverse_mass(r2, dir);
        if w < EPSILON {
            return base;
        }
        let p = dir * (len / w);
        b1.apply_impulse(p, r1);
        b2.apply_impulse(-p, r2);
        base + p.dot(n).abs()
    }
}

/// Collects every contact for the current substep into `out` and returns
/// the slots of sleeping bodies that were touched and must wake.
pub(crate) fn detect(bodies: &Arena<RigidBody>, out: &mut Vec<Contact>) -> Vec<usize> {
    out.clear();
    let mut wake = Vec::new();
    let capacity = bodies.capacity();
    for i in 0..capacity {
        let Some(body) = bodies.at(i) else {
            continue;
        };
        if !body.is_simulated() {
            continue;
        }
        let Some(samples) = body.box_samples() else {
            continue;
        };
        for j in 0..capacity {
            if i == j {
                continue;
            }
            let Some(other) = bodies.at(j) else {
                continue;
            };
            if shares_group(body, other) {
                continue;
            }
            let movable = !other.is_static() && !other.is_frozen();
            if movable {
                // Simulated pairs are visited once, from the lower slot.
                if other.is_simulated() && j < i {
                    continue;
                }
                if let Some(contact) = sphere_contact(i, body, j, other) {
                    if other.is_sleeping() {
                        wake.push(j);
                    }
                    out.push(contact);
                }
            } else {
                surface_contacts(i, body, &samples, j, other, out);
            }
        }
    }
    wake
}

const fn shares_group(a: &RigidBody, b: &RigidBody) -> bool {
    a.group != 0 && a.group == b.group
}

fn combine(a: &RigidBody, b: &RigidBody) -> (f32, f32) {
    (
        (a.friction * b.friction).sqrt(),
        a.restitution.max(b.restitution),
    )
}

fn sphere_contact(i: usize, body: &RigidBody, j: usize, other: &RigidBody) -> Option<Contact> {
    let radius_sum = body.shape.proxy_radius() + other.shape.proxy_radius();
    let delta = body.position - other.position;
    let distance = delta.length();
    if distance >= radius_sum || distance < EPSILON {
        return None;
    }
    let normal = delta / distance;
    let (friction, restitution) = combine(body, other);
    let closing = -(body.linear_velocity - other.linear_velocity).dot(normal);
    Some(Contact {
        body: i,
        other: j,
        kind: ContactKind::Spheres { radius_sum },
        normal,
        lambda: 0.0,
        approach_speed: closing,
        friction,
        restitution,
    })
}

fn surface_contacts(
    i: usize,
    body: &RigidBody,
    samples: &[Vec3; 15],
    j: usize,
    other: &RigidBody,
    out: &mut Vec<Contact>,
) {
    if !matches!(other.shape, ColliderShape::Plane) {
        let reach = body.shape.bounding_radius() + other.shape.bounding_radius();
        if body.position.distance_squared(other.position) > reach * reach {
            return;
        }
    }
    let (friction, restitution) = combine(body, other);
    for &local in samples {
        let world = body.local_to_world(local);
        let Some((normal, depth)) = penetration(other, world) else {
            continue;
        };
        let surface = world + normal * depth;
        let r1 = body.rotation * local;
        let closing = -body.point_velocity(r1).dot(normal);
        out.push(Contact {
            body: i,
            other: j,
            kind: ContactKind::Surface {
                local1: local,
                local2: other.world_to_local(surface),
            },
            normal,
            lambda: 0.0,
            approach_speed: closing,
            friction,
            restitution,
        });
    }
}

/// Outward normal and depth of `point` inside the shape of `other`.
fn penetration(other: &RigidBody, point: Vec3) -> Option<(Vec3, f32)> {
    match other.shape {
        ColliderShape::Plane => {
            let depth = other.position.y - point.y;
            (depth > 0.0).then_some((Vec3::Y, depth))
        }
        ColliderShape::Cuboid { half_extents } => {
            let local = other.world_to_local(point);
            let gaps = half_extents - local.abs();
            if gaps.min_element() <= 0.0 {
                return None;
            }
            let (axis, depth) = if gaps.x <= gaps.y && gaps.x <= gaps.z {
                (Vec3::X * local.x.signum(), gaps.x)
            } else if gaps.y <= gaps.z {
                (Vec3::Y * local.y.signum(), gaps.y)
            } else {
                (Vec3::Z * local.z.signum(), gaps.z)
            };
            Some((other.rotation * axis, depth))
        }
        ColliderShape::Cylinder {
            radius,
            half_height,
        } => {
            let local = other.world_to_local(point);
            let radial = local.x.hypot(local.z);
            let radial_gap = radius - radial;
            let height_gap = half_height - local.y.abs();
            if radial_gap <= 0.0 || height_gap <= 0.0 {
                return None;
            }
            let axis = if radial_gap < height_gap {
                if radial < EPSILON {
                    Vec3::X
                } else {
                    Vec3::new(local.x / radial, 0.0, local.z / radial)
                }
            } else {
                Vec3::Y * local.y.signum()
            };
            Some((other.rotation * axis, radial_gap.min(height_gap)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::{BodyDesc, ColliderType};
    use approx::assert_relative_eq;
    use glam::Quat;
    use rstest::rstest;

    fn fixed(shape: ColliderShape, position: Vec3) -> RigidBody {
        RigidBody::from_desc(
            &BodyDesc::fixed(shape, ColliderType::Generic).with_pose(position, Quat::IDENTITY),
        )
        .expect("valid static body")
    }

    #[rstest]
    fn plane_reports_depth_below_surface() {
        let ground = fixed(ColliderShape::Plane, Vec3::ZERO);
        let (normal, depth) = penetration(&ground, Vec3::new(3.0, -0.2, 1.0)).expect("below");
        assert_eq!(normal, Vec3::Y);
        assert_relative_eq!(depth, 0.2, epsilon = 1e-6);
        assert!(penetration(&ground, Vec3::new(0.0, 0.1, 0.0)).is_none());
    }

    #[rstest]
    fn box_picks_shallowest_face() {
        let wall = fixed(ColliderShape::cuboid(Vec3::new(1.0, 2.0, 1.0)), Vec3::ZERO);
        let (normal, depth) = penetration(&wall, Vec3::new(0.9, 0.0, 0.2)).expect("inside");
        assert_relative_eq!(normal, Vec3::X, epsilon = 1e-6);
        assert_relative_eq!(depth, 0.1, epsilon = 1e-5);
    }

    #[rstest]
    fn cylinder_pushes_radially() {
        let pole = fixed(
            ColliderShape::Cylinder {
                radius: 0.2,
                half_height: 2.0,
            },
            Vec3::new(0.0, 2.0, 0.0),
        );
        let (normal, depth) = penetration(&pole, Vec3::new(0.0, 1.0, -0.15)).expect("inside");
        assert_relative_eq!(normal, Vec3::NEG_Z, epsilon = 1e-6);
        assert_relative_eq!(depth, 0.05, epsilon = 1e-5);
    }

    #[rstest]
    fn same_group_never_collides() {
        let mut bodies = Arena::default();
        let desc = BodyDesc::dynamic(1.0, Vec3::splat(0.2)).in_group(7);
        bodies.insert(RigidBody::from_desc(&desc).expect("valid"));
        bodies.insert(RigidBody::from_desc(&desc.clone().with_pose(Vec3::X * 0.1, Quat::IDENTITY)).expect("valid"));
        let mut contacts = Vec::new();
        detect(&bodies, &mut contacts);
        assert!(contacts.is_empty());
    }

    #[rstest]
    fn different_groups_collide_once() {
        let mut bodies = Arena::default();
        let a = BodyDesc::dynamic(1.0, Vec3::splat(0.2)).in_group(1);
        let b = a.clone().in_group(2).with_pose(Vec3::X * 0.1, Quat::IDENTITY);
        bodies.insert(RigidBody::from_desc(&a).expect("valid"));
        bodies.insert(RigidBody::from_desc(&b).expect("valid"));
        let mut contacts = Vec::new();
        detect(&bodies, &mut contacts);
        assert_eq!(contacts.len(), 1);
    }
}
