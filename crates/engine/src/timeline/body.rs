//! Capability contracts for the world objects the timeline records and drives.
//!
//! The engine never owns physics, animation, or rendering. It talks to them
//! through these traits, resolved once when an object is registered.

use std::fmt;

use super::math::Vec2;
use super::state::{AnimationSample, TimelineState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyKey(pub u64);

pub trait PhysicsBody {
    fn body_key(&self) -> BodyKey;
    fn position(&self) -> Vec2;
    fn rotation(&self) -> f32;
    fn velocity(&self) -> Vec2;
    fn angular_velocity(&self) -> f32;
    fn set_position(&mut self, position: Vec2);
    fn set_rotation(&mut self, rotation: f32);
    fn set_velocity(&mut self, velocity: Vec2);
    fn set_angular_velocity(&mut self, angular_velocity: f32);
    /// `false` makes the body kinematic (script-driven), `true` hands it to
    /// the physics simulation.
    fn set_simulated(&mut self, simulated: bool);
    fn collision_enabled(&self) -> bool;
    fn set_collision_enabled(&mut self, enabled: bool);
    fn ignore_collision_with(&mut self, other: BodyKey, ignore: bool);
}

pub trait AnimationSource {
    fn current_state(&self) -> Option<AnimationSample>;
    fn play(&mut self, state_id: u32, normalized_time: f32);

    /// Optional float animator parameter (e.g. vertical speed).
    fn custom_scalar(&self) -> Option<f32> {
        None
    }

    fn set_custom_scalar(&mut self, _value: f32) {}
}

pub trait SpriteFacing {
    fn flip_x(&self) -> bool;
    fn set_flip_x(&mut self, flip_x: bool);
}

/// Spawns and destroys the ghost entities that replay archived branches.
pub trait ReplicaFactory {
    fn spawn_replica(&mut self, initial: &TimelineState) -> TrackedBody;

    fn destroy_replica(&mut self, replica: TrackedBody) {
        drop(replica);
    }
}

/// A physics body plus whichever optional capabilities the entity has.
pub struct TrackedBody {
    physics: Box<dyn PhysicsBody>,
    animation: Option<Box<dyn AnimationSource>>,
    sprite: Option<Box<dyn SpriteFacing>>,
}

impl TrackedBody {
    pub fn new(physics: impl PhysicsBody + 'static) -> Self {
        Self {
            physics: Box::new(physics),
            animation: None,
            sprite: None,
        }
    }

    pub fn with_animation(mut self, animation: impl AnimationSource + 'static) -> Self {
        self.animation = Some(Box::new(animation));
        self
    }

    pub fn with_sprite(mut self, sprite: impl SpriteFacing + 'static) -> Self {
        self.sprite = Some(Box::new(sprite));
        self
    }

    pub fn key(&self) -> BodyKey {
        self.physics.body_key()
    }

    pub fn physics(&self) -> &dyn PhysicsBody {
        self.physics.as_ref()
    }

    pub fn physics_mut(&mut self) -> &mut dyn PhysicsBody {
        self.physics.as_mut()
    }

    pub fn has_animation(&self) -> bool {
        self.animation.is_some()
    }

    pub fn has_sprite(&self) -> bool {
        self.sprite.is_some()
    }

    pub fn capture(&self, time: f64) -> TimelineState {
        let (animation, custom_scalar) = match &self.animation {
            Some(animation) => (animation.current_state(), animation.custom_scalar()),
            None => (None, None),
        };
        TimelineState {
            time,
            position: self.physics.position(),
            rotation: self.physics.rotation(),
            velocity: self.physics.velocity(),
            angular_velocity: self.physics.angular_velocity(),
            animation,
            sprite_flip_x: self.sprite.as_ref().map(|sprite| sprite.flip_x()),
            custom_scalar,
        }
    }

    /// Snaps a live object onto `state`, motion included.
    pub fn apply_live(&mut self, state: &TimelineState) {
        self.apply_pose(state);
        self.physics.set_velocity(state.velocity);
        self.physics.set_angular_velocity(state.angular_velocity);
    }

    /// Moves a script-driven body onto `state` without touching its motion.
    pub fn apply_pose(&mut self, state: &TimelineState) {
        self.physics.set_position(state.position);
        self.physics.set_rotation(state.rotation);
        self.apply_visuals(state);
    }

    fn apply_visuals(&mut self, state: &TimelineState) {
        if let Some(animation) = self.animation.as_mut() {
            if let Some(value) = state.custom_scalar {
                animation.set_custom_scalar(value);
            }
            if let Some(sample) = state.animation {
                animation.play(sample.state_id, sample.playback_time());
            }
        }
        if let (Some(sprite), Some(flip_x)) = (self.sprite.as_mut(), state.sprite_flip_x) {
            sprite.set_flip_x(flip_x);
        }
    }
}

impl fmt::Debug for TrackedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedBody")
            .field("key", &self.key())
            .field("has_animation", &self.has_animation())
            .field("has_sprite", &self.has_sprite())
            .finish()
    }
}

/// Collision settings a replica had when it was spawned, restored when it
/// turns into a live object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CollisionSnapshot {
    pub(crate) collision_enabled: bool,
    pub(crate) ignored_source: BodyKey,
}

impl CollisionSnapshot {
    pub(crate) fn capture_and_disable(body: &mut dyn PhysicsBody, source: BodyKey) -> Self {
        let snapshot = Self {
            collision_enabled: body.collision_enabled(),
            ignored_source: source,
        };
        body.set_collision_enabled(false);
        body.ignore_collision_with(source, true);
        snapshot
    }

    pub(crate) fn restore(&self, body: &mut dyn PhysicsBody) {
        body.set_collision_enabled(self.collision_enabled);
        body.ignore_collision_with(self.ignored_source, false);
    }
}
