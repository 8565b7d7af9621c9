use rewind_engine::Vec2;

use crate::app::physics::Aabb;

/// Touching it rewinds the world. Ghosts that wander into it are destroyed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RewindZone {
    pub(crate) bounds: Aabb,
    pub(crate) rewind_seconds: f64,
    pub(crate) uses_remaining: u32,
}

/// Kills whatever enters it: the player respawns on a fresh timeline and
/// ghosts are destroyed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ResetZone {
    pub(crate) bounds: Aabb,
}

/// Moves the respawn point and starts a fresh timeline. Unlocks once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Checkpoint {
    pub(crate) bounds: Aabb,
    pub(crate) respawn: Vec2,
    pub(crate) reached: bool,
}

impl Checkpoint {
    pub(crate) fn new(bounds: Aabb, respawn: Vec2) -> Self {
        Self {
            bounds,
            respawn,
            reached: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PatrolRoute {
    pub(crate) start: Vec2,
    pub(crate) min_x: f32,
    pub(crate) max_x: f32,
    pub(crate) speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Level {
    pub(crate) player_spawn: Vec2,
    pub(crate) crate_spawn: Vec2,
    pub(crate) patrol: PatrolRoute,
    pub(crate) rewind_zones: Vec<RewindZone>,
    pub(crate) reset_zones: Vec<ResetZone>,
    pub(crate) checkpoints: Vec<Checkpoint>,
}

impl Level {
    pub(crate) fn demo() -> Self {
        Self {
            player_spawn: Vec2::new(0.0, 0.5),
            crate_spawn: Vec2::new(8.0, 0.5),
            patrol: PatrolRoute {
                start: Vec2::new(17.0, 0.45),
                min_x: 15.0,
                max_x: 19.0,
                speed: 2.0,
            },
            rewind_zones: vec![RewindZone {
                bounds: Aabb::new(Vec2::new(13.0, 1.0), Vec2::new(0.5, 1.0)),
                rewind_seconds: 2.5,
                uses_remaining: 1,
            }],
            reset_zones: vec![ResetZone {
                bounds: Aabb::new(Vec2::new(22.0, 1.0), Vec2::new(0.5, 1.0)),
            }],
            checkpoints: vec![Checkpoint::new(
                Aabb::new(Vec2::new(11.0, 1.0), Vec2::new(0.5, 1.0)),
                Vec2::new(11.0, 0.5),
            )],
        }
    }
}
