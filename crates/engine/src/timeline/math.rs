use std::f32::consts::{PI, TAU};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, other: Vec2, u: f32) -> Vec2 {
        Vec2 {
            x: lerp(self.x, other.x, u),
            y: lerp(self.y, other.y, u),
        }
    }
}

pub fn lerp(a: f32, b: f32, u: f32) -> f32 {
    a + (b - a) * u
}

/// Interpolates between two angles in radians along the shorter arc.
///
/// The result is not wrapped: at `u == 0` it is exactly `a`, so recorded
/// rotations survive a round trip through the sampler unchanged.
pub fn lerp_angle(a: f32, b: f32, u: f32) -> f32 {
    let mut delta = (b - a).rem_euclid(TAU);
    if delta > PI {
        delta -= TAU;
    }
    a + delta * u
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_angle_takes_shorter_arc_across_wrap() {
        let a = 350.0_f32.to_radians();
        let b = 10.0_f32.to_radians();
        let mid = lerp_angle(a, b, 0.5);
        assert!((mid - 360.0_f32.to_radians()).abs() < 1e-4, "mid {mid}");
    }

    #[test]
    fn lerp_angle_endpoints_are_exact_at_zero() {
        let a = 1.25_f32;
        let b = -2.5_f32;
        assert_eq!(lerp_angle(a, b, 0.0), a);
    }

    #[test]
    fn vec2_lerp_midpoint() {
        let mid = Vec2::new(0.0, 2.0).lerp(Vec2::new(10.0, 4.0), 0.5);
        assert_eq!(mid, Vec2::new(5.0, 3.0));
    }
}
