use super::math::{lerp, lerp_angle};
use super::state::{AnimationSample, TimelineState};

/// Interval widths at or below this are treated as zero when interpolating.
pub const TIME_EPSILON: f64 = 1e-4;

/// Samples `states` at time `t`.
///
/// Queries before the first or after the last state return that state
/// unchanged; nothing is extrapolated. A NaN query reads as the first state.
/// `states` must be non-empty and strictly ordered by time.
pub fn sample(states: &[TimelineState], t: f64) -> TimelineState {
    assert!(!states.is_empty(), "sample called on an empty history");

    let first = states[0];
    let last = states[states.len() - 1];
    if t.is_nan() || t <= first.time {
        return first;
    }
    if t >= last.time {
        return last;
    }

    // First index with time > t; the bounds checks above keep it in 1..len.
    let hi = states.partition_point(|state| state.time <= t);
    let a = &states[hi - 1];
    let b = &states[hi];

    let width = b.time - a.time;
    let u = if width <= TIME_EPSILON {
        0.0
    } else {
        ((t - a.time) / width).clamp(0.0, 1.0)
    };
    interpolate(a, b, u as f32, t)
}

/// Blends two states. Continuous fields interpolate; discrete fields switch
/// from `a` to `b` only past the midpoint, so `u == 0.5` keeps `a`.
pub fn interpolate(a: &TimelineState, b: &TimelineState, u: f32, time: f64) -> TimelineState {
    TimelineState {
        time,
        position: a.position.lerp(b.position, u),
        rotation: lerp_angle(a.rotation, b.rotation, u),
        velocity: a.velocity.lerp(b.velocity, u),
        angular_velocity: lerp(a.angular_velocity, b.angular_velocity, u),
        animation: interpolate_animation(a.animation, b.animation, u),
        sprite_flip_x: pick_discrete(a.sprite_flip_x, b.sprite_flip_x, u),
        custom_scalar: match (a.custom_scalar, b.custom_scalar) {
            (Some(from), Some(to)) => Some(lerp(from, to, u)),
            (from, to) => from.or(to),
        },
    }
}

fn interpolate_animation(
    a: Option<AnimationSample>,
    b: Option<AnimationSample>,
    u: f32,
) -> Option<AnimationSample> {
    match (a, b) {
        (Some(from), Some(to)) if from.state_id == to.state_id => Some(AnimationSample {
            state_id: from.state_id,
            normalized_time: lerp(from.normalized_time, to.normalized_time, u),
            looping: from.looping,
        }),
        (from, to) => pick_discrete(from, to, u),
    }
}

fn pick_discrete<T: Copy>(a: Option<T>, b: Option<T>, u: f32) -> Option<T> {
    match (a, b) {
        (Some(from), Some(to)) => Some(if u <= 0.5 { from } else { to }),
        (from, to) => from.or(to),
    }
}
