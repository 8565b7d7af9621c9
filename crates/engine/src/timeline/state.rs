use super::math::Vec2;

/// Snapshot of an animator's current clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSample {
    pub state_id: u32,
    pub normalized_time: f32,
    pub looping: bool,
}

impl AnimationSample {
    /// Normalized time folded back into `[0, 1]` the way a player expects it:
    /// looping clips wrap, one-shot clips clamp.
    pub fn playback_time(&self) -> f32 {
        if self.looping {
            self.normalized_time.rem_euclid(1.0)
        } else {
            self.normalized_time.clamp(0.0, 1.0)
        }
    }
}

/// One entity at one instant on the recording clock.
///
/// Capability fields are `None` when the entity has no such capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineState {
    pub time: f64,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub animation: Option<AnimationSample>,
    pub sprite_flip_x: Option<bool>,
    pub custom_scalar: Option<f32>,
}

impl TimelineState {
    pub fn at_rest(time: f64, position: Vec2) -> Self {
        Self {
            time,
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            animation: None,
            sprite_flip_x: None,
            custom_scalar: None,
        }
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_animation(mut self, animation: AnimationSample) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn with_sprite_flip_x(mut self, flip_x: bool) -> Self {
        self.sprite_flip_x = Some(flip_x);
        self
    }

    pub fn with_custom_scalar(mut self, value: f32) -> Self {
        self.custom_scalar = Some(value);
        self
    }
}
