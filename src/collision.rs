//! Player-versus-obstacle overlap and near-miss tests.
//!
//! Boxes are axis aligned. Only obstacles inside a Z window around the
//! player are considered at all. Overlap is tested along the whole tick's
//! relative motion, so a long frame cannot carry the player through a thin
//! obstacle. An obstacle that has fallen more than the pass margin behind
//! the player is "passed" and, if the gap between the two boxes across the
//! player's heading was small enough, scores a near miss.

use glam::Vec3;

use crate::components::{Collider, ObstacleKind, Transform};
use crate::config::CollisionTuning;

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lowest corner.
    pub min: Vec3,
    /// Highest corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box around `center`; negative extents are mirrored.
    #[must_use]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// World box of a collider attached to `transform`. Rotation is ignored.
    #[must_use]
    pub fn of(transform: &Transform, collider: &Collider) -> Self {
        Self::from_center(transform.position + collider.offset, collider.half_extents)
    }

    /// Midpoint of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half size along each axis.
    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Touching faces count as overlap.
    ///
    /// ```
    /// use glam::Vec3;
    /// use monowheel::collision::Aabb;
    /// let a = Aabb::from_center(Vec3::ZERO, Vec3::ONE);
    /// let b = Aabb::from_center(Vec3::new(2.0, 0.0, 0.0), Vec3::ONE);
    /// let c = Aabb::from_center(Vec3::new(2.1, 0.0, 0.0), Vec3::ONE);
    /// assert!(a.overlaps(&b));
    /// assert!(!a.overlaps(&c));
    /// ```
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Whether this box touches `other` at any point while moving by
    /// `delta`. The box starts at its current place.
    ///
    /// ```
    /// use glam::Vec3;
    /// use monowheel::collision::Aabb;
    /// let rider = Aabb::from_center(Vec3::ZERO, Vec3::splat(0.3));
    /// let post = Aabb::from_center(Vec3::new(0.0, 0.0, -0.5), Vec3::splat(0.1));
    /// assert!(rider.sweep_hits(Vec3::new(0.0, 0.0, -1.0), &post));
    /// assert!(!rider.sweep_hits(Vec3::new(0.0, 0.0, 1.0), &post.translated(Vec3::NEG_Z)));
    /// ```
    #[must_use]
    pub fn sweep_hits(&self, delta: Vec3, other: &Self) -> bool {
        let reach = other.half_extents() + self.half_extents();
        let target = Self::from_center(other.center(), reach);
        let start = self.center();
        let spans = [
            slab(start.x, delta.x, target.min.x, target.max.x),
            slab(start.y, delta.y, target.min.y, target.max.y),
            slab(start.z, delta.z, target.min.z, target.max.z),
        ];
        let mut enter = 0.0_f32;
        let mut exit = 1.0_f32;
        for span in spans {
            let Some((near, far)) = span else {
                return false;
            };
            enter = enter.max(near);
            exit = exit.min(far);
        }
        enter <= exit
    }

    /// The same box moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Half the box's extent when projected onto `axis`.
    #[must_use]
    pub fn projected_radius(&self, axis: Vec3) -> f32 {
        self.half_extents().dot(axis.abs())
    }
}

/// Fractions of a move from `start` by `delta` spent inside `[lo, hi]` on
/// one axis, or `None` when the move never enters it.
fn slab(start: f32, delta: f32, lo: f32, hi: f32) -> Option<(f32, f32)> {
    if delta.abs() <= f32::EPSILON {
        return (lo..=hi)
            .contains(&start)
            .then_some((f32::NEG_INFINITY, f32::INFINITY));
    }
    let a = (lo - start) / delta;
    let b = (hi - start) / delta;
    Some((a.min(b), a.max(b)))
}

/// Edge-to-edge gap between two boxes measured along `axis` (a unit
/// vector). Zero when their projections overlap.
#[must_use]
pub fn lateral_gap(player: &Aabb, obstacle: &Aabb, axis: Vec3) -> f32 {
    let centres = (obstacle.center() - player.center()).dot(axis).abs();
    (centres - player.projected_radius(axis) - obstacle.projected_radius(axis)).max(0.0)
}

/// What the detector concluded about one obstacle this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Out of the window or still ahead without touching.
    Clear,
    /// Touched at some point during the tick.
    Overlap,
    /// Fell behind the player without touching.
    Passed {
        /// Lateral clearance at the moment of passing.
        gap: f32,
        /// Whether the clearance was tight enough to score.
        near_miss: bool,
    },
}

/// Per-tick player geometry shared by every obstacle test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiderSweep {
    /// Box at the end of the tick.
    pub bounds: Aabb,
    /// Rider position at the end of the tick.
    pub position: Vec3,
    /// Distance moved this tick.
    pub motion: Vec3,
    /// Unit heading.
    pub forward: Vec3,
    /// Unit vector to the rider's right.
    pub right: Vec3,
}

/// Classifies one obstacle relative to the player.
///
/// `obstacle` is the box at the end of the tick and `obstacle_motion` how
/// far it moved during it. The caller owns the obstacle's flags; this only
/// reports what the geometry says. Touching at any point of the tick wins
/// over passing.
#[must_use]
pub fn assess(
    rider: &RiderSweep,
    obstacle: &Aabb,
    obstacle_motion: Vec3,
    kind: ObstacleKind,
    tuning: &CollisionTuning,
) -> Verdict {
    let centre = obstacle.center();
    if (centre.z - rider.position.z).abs() > tuning.window {
        return Verdict::Clear;
    }
    let relative = rider.motion - obstacle_motion;
    let start = rider.bounds.translated(-relative);
    if rider.bounds.overlaps(obstacle) || start.sweep_hits(relative, obstacle) {
        return Verdict::Overlap;
    }
    let ahead = (centre - rider.position).dot(rider.forward);
    if ahead < -tuning.pass_margin {
        let gap = lateral_gap(&rider.bounds, obstacle, rider.right);
        let near_miss = kind.scores_near_miss() && gap < kind.near_miss_threshold(tuning);
        return Verdict::Passed { gap, near_miss };
    }
    Verdict::Clear
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn rider() -> RiderSweep {
        RiderSweep {
            bounds: Aabb::from_center(Vec3::new(0.0, 0.9, 0.0), Vec3::new(0.3, 0.9, 0.3)),
            position: Vec3::ZERO,
            motion: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
        }
    }

    fn pedestrian_at(x: f32, z: f32) -> Aabb {
        Aabb::from_center(Vec3::new(x, 0.9, z), Vec3::new(0.25, 0.9, 0.25))
    }

    #[rstest]
    fn gap_is_measured_edge_to_edge(rider: RiderSweep) {
        let obstacle = pedestrian_at(1.05, 3.0);
        assert_relative_eq!(lateral_gap(&rider.bounds, &obstacle, rider.right), 0.5, epsilon = 1e-5);
    }

    #[rstest]
    fn obstacles_outside_window_are_ignored(rider: RiderSweep) {
        let verdict = assess(
            &rider,
            &pedestrian_at(0.0, -30.0),
            Vec3::ZERO,
            ObstacleKind::Pedestrian,
            &CollisionTuning::default(),
        );
        assert_eq!(verdict, Verdict::Clear);
    }

    #[rstest]
    fn overlap_is_reported(rider: RiderSweep) {
        let verdict = assess(
            &rider,
            &pedestrian_at(0.2, -0.2),
            Vec3::ZERO,
            ObstacleKind::Pedestrian,
            &CollisionTuning::default(),
        );
        assert_eq!(verdict, Verdict::Overlap);
    }

    #[rstest]
    #[case(ObstacleKind::Pedestrian, 1.05, true)]
    #[case(ObstacleKind::Pedestrian, 2.5, false)]
    #[case(ObstacleKind::Car, 2.5, true)]
    #[case(ObstacleKind::Puddle, 1.05, false)]
    fn passing_behind_scores_by_kind(
        rider: RiderSweep,
        #[case] kind: ObstacleKind,
        #[case] x: f32,
        #[case] near_miss: bool,
    ) {
        let verdict = assess(
            &rider,
            &pedestrian_at(x, 1.5),
            Vec3::ZERO,
            kind,
            &CollisionTuning::default(),
        );
        match verdict {
            Verdict::Passed { near_miss: scored, .. } => assert_eq!(scored, near_miss),
            other => panic!("expected a pass, got {other:?}"),
        }
    }

    #[rstest]
    fn alongside_is_not_yet_passed(rider: RiderSweep) {
        let verdict = assess(
            &rider,
            &pedestrian_at(1.05, 0.5),
            Vec3::ZERO,
            ObstacleKind::Pedestrian,
            &CollisionTuning::default(),
        );
        assert_eq!(verdict, Verdict::Clear);
    }

    fn street_light_at(z: f32) -> Aabb {
        Aabb::from_center(Vec3::new(0.0, 2.5, z), Vec3::new(0.12, 2.5, 0.12))
    }

    #[rstest]
    fn long_step_through_a_post_still_overlaps(mut rider: RiderSweep) {
        // A metre per tick clears the 0.84 m the two boxes span along Z.
        rider.motion = Vec3::new(0.0, 0.0, -1.0);
        let verdict = assess(
            &rider,
            &street_light_at(0.5),
            Vec3::ZERO,
            ObstacleKind::StreetLight,
            &CollisionTuning::default(),
        );
        assert_eq!(verdict, Verdict::Overlap);
    }

    #[rstest]
    fn closing_traffic_counts_both_motions(mut rider: RiderSweep) {
        rider.motion = Vec3::new(0.0, 0.0, -0.6);
        let car = Aabb::from_center(Vec3::new(0.0, 0.75, 1.5), Vec3::new(0.9, 0.75, 0.6));
        let verdict = assess(
            &rider,
            &car,
            Vec3::new(0.0, 0.0, 2.0),
            ObstacleKind::Car,
            &CollisionTuning::default(),
        );
        assert_eq!(verdict, Verdict::Overlap);
    }

    #[rstest]
    fn long_step_beside_a_post_is_a_clean_pass(mut rider: RiderSweep) {
        rider.motion = Vec3::new(0.0, 0.0, -1.0);
        let post = street_light_at(1.5).translated(Vec3::new(0.6, 0.0, 0.0));
        match assess(
            &rider,
            &post,
            Vec3::ZERO,
            ObstacleKind::StreetLight,
            &CollisionTuning::default(),
        ) {
            Verdict::Passed { gap, .. } => assert_relative_eq!(gap, 0.18, epsilon = 1e-5),
            other => panic!("expected a pass, got {other:?}"),
        }
    }
}
