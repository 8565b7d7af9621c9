use rewind_engine::{ReplicaFactory, TimelineState, TrackedBody, Vec2};

use crate::app::animation::SpriteAnimator;
use crate::app::physics::PhysicsWorld;

/// Spawns ghost bodies into the shared physics world.
#[derive(Debug, Clone)]
pub(crate) struct GhostFactory {
    world: PhysicsWorld,
    half_extents: Vec2,
    animated: bool,
}

impl GhostFactory {
    pub(crate) fn new(world: PhysicsWorld, half_extents: Vec2) -> Self {
        Self {
            world,
            half_extents,
            animated: false,
        }
    }

    pub(crate) fn animated(mut self) -> Self {
        self.animated = true;
        self
    }
}

impl ReplicaFactory for GhostFactory {
    fn spawn_replica(&mut self, initial: &TimelineState) -> TrackedBody {
        let body = TrackedBody::new(self.world.spawn_body(initial.position, self.half_extents));
        if !self.animated {
            return body;
        }
        let animator = SpriteAnimator::default();
        body.with_animation(animator.clone()).with_sprite(animator)
    }

    fn destroy_replica(&mut self, replica: TrackedBody) {
        self.world.remove_body(replica.key());
    }
}
