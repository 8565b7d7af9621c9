mod ghosts;
mod level;

use rewind_engine::{
    ReplicaId, TimelineDirector, TimelineEvent, TrackedBody, TrackedObjectDesc, Vec2,
};
use serde::Serialize;
use tracing::{debug, info};

use super::animation::{SpriteAnimator, CLIP_IDLE, CLIP_JUMP, CLIP_RUN};
use super::physics::{BodyHandle, PhysicsWorld};
use super::scenario::{Scenario, ScenarioAction, ScenarioCursor};

use ghosts::GhostFactory;
pub(crate) use level::Level;

pub(crate) const PLAYER_HALF_EXTENTS: Vec2 = Vec2::new(0.4, 0.5);
const CRATE_HALF_EXTENTS: Vec2 = Vec2::new(0.5, 0.5);
const PATROL_HALF_EXTENTS: Vec2 = Vec2::new(0.45, 0.45);
const PLAYER_RUN_SPEED: f32 = 4.0;
const PLAYER_JUMP_SPEED: f32 = 11.0;
const PATROL_MAX_BRANCHES: usize = 3;
const MOVING_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct SceneCounters {
    pub(crate) zone_rewinds: u32,
    pub(crate) scripted_rewinds: u32,
    pub(crate) ghosts_despawned: u32,
    pub(crate) replicas_handed_off: u32,
    pub(crate) checkpoints_reached: u32,
    pub(crate) respawns: u32,
    pub(crate) reference_resets: u32,
}

/// Scripted side-scroller: a player that runs and jumps through rewind zones,
/// reset zones and checkpoints, plus a pushable crate and a patrolling drone.
/// The timeline records all of them.
#[derive(Debug)]
pub(crate) struct PlatformerScene {
    world: PhysicsWorld,
    level: Level,
    script: ScenarioCursor,
    player: BodyHandle,
    player_animator: SpriteAnimator,
    patroller: BodyHandle,
    patrol_direction: f32,
    run_direction: f32,
    jump_requested: bool,
    elapsed_seconds: f64,
    freeze_remaining: Option<f64>,
    player_in_zone: Vec<bool>,
    player_in_reset_zone: Vec<bool>,
    active_respawn: Vec2,
    counters: SceneCounters,
}

impl PlatformerScene {
    pub(crate) fn load(level: Level, scenario: &Scenario, timeline: &mut TimelineDirector) -> Self {
        let world = PhysicsWorld::default();

        let player_body = world.spawn_body(level.player_spawn, PLAYER_HALF_EXTENTS);
        let player_animator = SpriteAnimator::default();
        timeline.register(
            TrackedObjectDesc::new(
                "player",
                TrackedBody::new(player_body.clone())
                    .with_animation(player_animator.clone())
                    .with_sprite(player_animator.clone()),
            )
            .with_replicas(GhostFactory::new(world.clone(), PLAYER_HALF_EXTENTS).animated()),
        );

        let crate_body = world.spawn_body(level.crate_spawn, CRATE_HALF_EXTENTS);
        timeline.register(TrackedObjectDesc::new("crate", TrackedBody::new(crate_body)));

        let patrol_body = world.spawn_body(level.patrol.start, PATROL_HALF_EXTENTS);
        timeline.register(
            TrackedObjectDesc::new("patroller", TrackedBody::new(patrol_body.clone()))
                .with_replicas(GhostFactory::new(world.clone(), PATROL_HALF_EXTENTS))
                .with_max_branches(PATROL_MAX_BRANCHES),
        );

        info!(
            scenario = scenario.name.as_str(),
            bodies = world.body_count(),
            rewind_zones = level.rewind_zones.len(),
            reset_zones = level.reset_zones.len(),
            checkpoints = level.checkpoints.len(),
            "scene_loaded"
        );

        Self {
            player_in_zone: vec![false; level.rewind_zones.len()],
            player_in_reset_zone: vec![false; level.reset_zones.len()],
            active_respawn: level.player_spawn,
            world,
            level,
            script: ScenarioCursor::new(scenario),
            player: player_body,
            player_animator,
            patroller: patrol_body,
            patrol_direction: 1.0,
            run_direction: 0.0,
            jump_requested: false,
            elapsed_seconds: 0.0,
            freeze_remaining: None,
            counters: SceneCounters::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn player_position(&self) -> Vec2 {
        self.player.snapshot().position
    }

    #[cfg(test)]
    pub(crate) fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub(crate) fn counters(&self) -> SceneCounters {
        self.counters
    }

    pub(crate) fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    #[cfg(test)]
    pub(crate) fn script_finished(&self) -> bool {
        self.script.is_finished()
    }

    /// One fixed step: scripted input, physics, triggers, then the timeline.
    pub(crate) fn tick(&mut self, dt: f64, timeline: &mut TimelineDirector) {
        self.elapsed_seconds += dt;
        for action in self.script.take_due(self.elapsed_seconds) {
            self.apply_action(action, timeline);
        }
        self.update_freeze(dt, timeline);

        let step = dt as f32;
        self.drive_player();
        self.drive_patroller();
        self.world.step(step);
        self.animate_player(step);

        self.check_checkpoints(timeline);
        self.check_rewind_zones(timeline);
        self.check_reset_zones(timeline);
        self.despawn_ghosts_in_zones(timeline);

        timeline.tick(dt);
        for event in timeline.drain_events() {
            self.handle_timeline_event(&event);
        }
    }

    fn apply_action(&mut self, action: ScenarioAction, timeline: &mut TimelineDirector) {
        debug!(elapsed = self.elapsed_seconds, action = ?action, "scenario_action");
        match action {
            ScenarioAction::Run { direction } => self.run_direction = direction,
            ScenarioAction::Stop => self.run_direction = 0.0,
            ScenarioAction::Jump => self.jump_requested = true,
            ScenarioAction::Rewind { seconds } => {
                timeline.rewind(seconds);
                self.counters.scripted_rewinds += 1;
                self.refresh_trigger_flags();
            }
            ScenarioAction::Pause => {
                timeline.pause();
            }
            ScenarioAction::Resume => {
                self.freeze_remaining = None;
                timeline.resume();
            }
            ScenarioAction::Freeze { seconds } => {
                if timeline.pause() {
                    self.freeze_remaining = Some(seconds);
                }
            }
            ScenarioAction::Respawn => self.respawn(timeline),
        }
    }

    fn update_freeze(&mut self, dt: f64, timeline: &mut TimelineDirector) {
        let Some(remaining) = self.freeze_remaining else {
            return;
        };
        let remaining = remaining - dt;
        if remaining > 0.0 {
            self.freeze_remaining = Some(remaining);
            return;
        }
        self.freeze_remaining = None;
        timeline.resume();
    }

    fn respawn(&mut self, timeline: &mut TimelineDirector) {
        self.player.teleport(self.active_respawn);
        self.run_direction = 0.0;
        self.counters.respawns += 1;
        // The teleport settles during this step; the new time zero is taken
        // at the start of the next one.
        timeline.request_reset_reference();
        self.refresh_trigger_flags();
        info!(
            x = self.active_respawn.x,
            y = self.active_respawn.y,
            "player_respawned"
        );
    }

    fn drive_player(&mut self) {
        let body = &self.player;
        body.set_horizontal_velocity(self.run_direction * PLAYER_RUN_SPEED);
        if self.jump_requested && body.is_grounded() {
            body.set_vertical_velocity(PLAYER_JUMP_SPEED);
        }
        self.jump_requested = false;
    }

    fn drive_patroller(&mut self) {
        let route = self.level.patrol;
        let x = self.patroller.snapshot().position.x;
        if x >= route.max_x {
            self.patrol_direction = -1.0;
        } else if x <= route.min_x {
            self.patrol_direction = 1.0;
        }
        self.patroller
            .set_horizontal_velocity(self.patrol_direction * route.speed);
    }

    fn animate_player(&mut self, dt: f32) {
        let body = self.player.snapshot();
        let vx = body.velocity.x;
        let clip = if !body.grounded {
            CLIP_JUMP
        } else if vx.abs() > MOVING_EPSILON {
            CLIP_RUN
        } else {
            CLIP_IDLE
        };
        let facing = if vx > MOVING_EPSILON {
            Some(false)
        } else if vx < -MOVING_EPSILON {
            Some(true)
        } else {
            None
        };
        self.player_animator.drive(clip, dt, body.velocity.y, facing);
    }

    fn check_checkpoints(&mut self, timeline: &mut TimelineDirector) {
        let bounds = self.player.bounds();
        for (index, checkpoint) in self.level.checkpoints.iter_mut().enumerate() {
            if checkpoint.reached || !checkpoint.bounds.overlaps(&bounds) {
                continue;
            }
            checkpoint.reached = true;
            self.active_respawn = checkpoint.respawn;
            self.counters.checkpoints_reached += 1;
            // Nothing recorded before a save point may be rewound into.
            timeline.request_reset_reference();
            info!(checkpoint = index, "checkpoint_reached");
        }
    }

    fn check_rewind_zones(&mut self, timeline: &mut TimelineDirector) {
        let bounds = self.player.bounds();
        let mut entered = None;
        for (index, zone) in self.level.rewind_zones.iter().enumerate() {
            let inside = zone.bounds.overlaps(&bounds);
            if inside && !self.player_in_zone[index] && zone.uses_remaining > 0 {
                entered = Some(index);
            }
            self.player_in_zone[index] = inside;
        }

        let Some(index) = entered else {
            return;
        };
        let zone = &mut self.level.rewind_zones[index];
        zone.uses_remaining -= 1;
        let seconds = zone.rewind_seconds;
        info!(zone = index, seconds, "rewind_zone_entered");
        timeline.rewind(seconds);
        self.counters.zone_rewinds += 1;
        self.refresh_trigger_flags();
    }

    fn check_reset_zones(&mut self, timeline: &mut TimelineDirector) {
        let bounds = self.player.bounds();
        let mut entered = None;
        for (index, zone) in self.level.reset_zones.iter().enumerate() {
            let inside = zone.bounds.overlaps(&bounds);
            if inside && !self.player_in_reset_zone[index] {
                entered = Some(index);
            }
            self.player_in_reset_zone[index] = inside;
        }

        if let Some(index) = entered {
            info!(zone = index, "reset_zone_entered");
            self.respawn(timeline);
        }
    }

    fn despawn_ghosts_in_zones(&mut self, timeline: &mut TimelineDirector) {
        let doomed: Vec<ReplicaId> = timeline
            .objects()
            .iter()
            .flat_map(|object| object.replicas())
            .filter(|replica| {
                let position = replica.body().physics().position();
                let level = &self.level;
                level
                    .rewind_zones
                    .iter()
                    .any(|zone| zone.bounds.contains(position))
                    || level
                        .reset_zones
                        .iter()
                        .any(|zone| zone.bounds.contains(position))
            })
            .map(|replica| replica.id())
            .collect();

        for replica in doomed {
            if timeline.despawn_replica(replica) {
                self.counters.ghosts_despawned += 1;
                debug!(replica = replica.0, "ghost_despawned_in_zone");
            }
        }
    }

    fn refresh_trigger_flags(&mut self) {
        let bounds = self.player.bounds();
        for (flag, zone) in self.player_in_zone.iter_mut().zip(&self.level.rewind_zones) {
            *flag = zone.bounds.overlaps(&bounds);
        }
        for (flag, zone) in self.player_in_reset_zone.iter_mut().zip(&self.level.reset_zones) {
            *flag = zone.bounds.overlaps(&bounds);
        }
    }

    fn handle_timeline_event(&mut self, event: &TimelineEvent) {
        match event {
            TimelineEvent::ReplicaHandedOff { object, replica } => {
                self.counters.replicas_handed_off += 1;
                debug!(object = object.0, replica = replica.0, "ghost_became_physical");
            }
            TimelineEvent::ReferenceReset => {
                self.counters.reference_resets += 1;
                self.freeze_remaining = None;
            }
            other => debug!(event = ?other, "timeline_event"),
        }
    }
}
