//! Numeric helpers used across the project.
//!
//! Small scalar utilities for interpolation and for keeping non-finite
//! values out of simulation state.

/// Linear interpolation between `from` and `to`.
///
/// # Examples
/// ```
/// use monowheel::numeric::lerp;
/// assert!((lerp(2.0, 4.0, 0.5) - 3.0).abs() < f32::EPSILON);
/// ```
#[must_use]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    (to - from).mul_add(t, from)
}

/// Moves `current` towards `target` by at most `max_delta`.
///
/// Never overshoots; a non-positive `max_delta` leaves `current` unchanged.
///
/// # Examples
/// ```
/// use monowheel::numeric::move_towards;
/// assert!((move_towards(0.0, 10.0, 3.0) - 3.0).abs() < f32::EPSILON);
/// assert!((move_towards(9.0, 10.0, 3.0) - 10.0).abs() < f32::EPSILON);
/// ```
#[must_use]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if max_delta <= 0.0 {
        return current;
    }
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        max_delta.copysign(delta) + current
    }
}

/// Returns `value` when finite, otherwise `fallback`.
#[must_use]
pub const fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Frame delta sanitised for simulation use.
///
/// Negative and non-finite deltas become zero; large ones are clamped to
/// `max_dt` so a stalled frame cannot inject an enormous step.
#[must_use]
pub fn sanitize_dt(dt: f32, max_dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, max_dt)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 1.0, 0.0, 0.0)]
    #[case(0.0, 1.0, 1.0, 1.0)]
    #[case(3.0, 12.0, 0.5, 7.5)]
    fn lerp_hits_endpoints(#[case] from: f32, #[case] to: f32, #[case] t: f32, #[case] out: f32) {
        assert_relative_eq!(lerp(from, to, t), out);
    }

    #[rstest]
    #[case(5.0, 0.0, 2.0, 3.0)]
    #[case(5.0, 0.0, 10.0, 0.0)]
    #[case(5.0, 0.0, -1.0, 5.0)]
    fn move_towards_never_overshoots(
        #[case] current: f32,
        #[case] target: f32,
        #[case] step: f32,
        #[case] out: f32,
    ) {
        assert_relative_eq!(move_towards(current, target, step), out);
    }

    #[rstest]
    #[case(f32::NAN, 0.0)]
    #[case(-0.5, 0.0)]
    #[case(1.0, 1.0 / 30.0)]
    #[case(0.01, 0.01)]
    fn sanitize_dt_clamps(#[case] dt: f32, #[case] out: f32) {
        assert_relative_eq!(sanitize_dt(dt, 1.0 / 30.0), out);
    }

    #[rstest]
    fn finite_or_replaces_infinity() {
        assert_relative_eq!(finite_or(f32::INFINITY, 2.0), 2.0);
        assert_relative_eq!(finite_or(1.5, 2.0), 1.5);
    }
}
