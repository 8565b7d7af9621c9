use super::body::{BodyKey, CollisionSnapshot, TrackedBody};
use super::branch::BranchData;
use super::math::Vec2;
use super::sampler::sample;
use super::state::TimelineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Playing,
    Ended,
}

/// Replays one archived branch onto one replica body.
///
/// Playback is keyed to the branch clock: a player spawned at branch time
/// `s` shows the branch state at `recording_start + (branch_time - s)`, so it
/// freezes whenever the branch clock does.
#[derive(Debug, Clone)]
pub struct BranchPlayer {
    states: Vec<TimelineState>,
    spawn_branch_time: f64,
    recording_start: f64,
    recording_end: f64,
    phase: PlaybackPhase,
    collision: CollisionSnapshot,
}

impl BranchPlayer {
    /// Takes over `body`: kinematic, motionless, collision off and posed on
    /// the first branch state.
    pub(crate) fn attach(
        branch: &BranchData,
        spawn_branch_time: f64,
        body: &mut TrackedBody,
        source: BodyKey,
    ) -> Self {
        let states = branch.states().to_vec();
        assert!(
            states.len() >= 2,
            "branch player needs at least two recorded states"
        );

        let physics = body.physics_mut();
        physics.set_velocity(Vec2::ZERO);
        physics.set_angular_velocity(0.0);
        physics.set_simulated(false);
        let collision = CollisionSnapshot::capture_and_disable(physics, source);
        body.apply_pose(&states[0]);

        Self {
            spawn_branch_time,
            recording_start: branch.recording_start(),
            recording_end: branch.recording_end(),
            phase: PlaybackPhase::Playing,
            collision,
            states,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn spawn_branch_time(&self) -> f64 {
        self.spawn_branch_time
    }

    pub fn recording_start(&self) -> f64 {
        self.recording_start
    }

    pub fn recording_end(&self) -> f64 {
        self.recording_end
    }

    pub fn states(&self) -> &[TimelineState] {
        &self.states
    }

    /// Recording-clock time shown at `branch_time`, clamped to the branch.
    pub fn target_time(&self, branch_time: f64) -> f64 {
        let target = branch_time - self.spawn_branch_time + self.recording_start;
        if target.is_nan() {
            return self.recording_start;
        }
        target.clamp(self.recording_start, self.recording_end)
    }

    pub fn tick(&mut self, branch_time: f64, body: &mut TrackedBody) -> PlaybackPhase {
        if self.phase == PlaybackPhase::Ended {
            return self.phase;
        }

        let target = self.target_time(branch_time);
        if target >= self.recording_end {
            self.hand_off(body);
        } else {
            body.apply_pose(&sample(&self.states, target));
        }
        self.phase
    }

    fn hand_off(&mut self, body: &mut TrackedBody) {
        let last = self.states[self.states.len() - 1];
        body.apply_pose(&last);

        let physics = body.physics_mut();
        physics.set_velocity(last.velocity);
        physics.set_angular_velocity(last.angular_velocity);
        self.collision.restore(physics);
        physics.set_simulated(true);
        self.phase = PlaybackPhase::Ended;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::test_support::FakeBody;

    fn straight_branch() -> BranchData {
        BranchData::new(vec![
            TimelineState::at_rest(5.0, Vec2::new(5.0, 0.0)).with_velocity(Vec2::new(1.0, 0.0)),
            TimelineState::at_rest(10.0, Vec2::new(10.0, 0.0)).with_velocity(Vec2::new(1.0, 0.0)),
            TimelineState::at_rest(20.0, Vec2::new(20.0, 0.0))
                .with_velocity(Vec2::new(3.0, 1.0))
                .with_rotation(0.5),
        ])
        .expect("branch")
    }

    #[test]
    fn attach_makes_body_kinematic_and_poses_first_state() {
        let (fake, probe) = FakeBody::new(9, Vec2::new(-4.0, -4.0));
        let mut body = TrackedBody::new(fake);
        body.physics_mut().set_velocity(Vec2::new(7.0, 7.0));

        let player = BranchPlayer::attach(&straight_branch(), 5.0, &mut body, BodyKey(1));

        let state = probe.borrow();
        assert_eq!(player.phase(), PlaybackPhase::Playing);
        assert_eq!(state.position, Vec2::new(5.0, 0.0));
        assert_eq!(state.velocity, Vec2::ZERO);
        assert!(!state.simulated);
        assert!(!state.collision_enabled);
        assert!(state.ignored.contains(&BodyKey(1)));
    }

    #[test]
    fn playback_follows_branch_clock_from_spawn() {
        let (fake, probe) = FakeBody::new(9, Vec2::ZERO);
        let mut body = TrackedBody::new(fake);
        let mut player = BranchPlayer::attach(&straight_branch(), 100.0, &mut body, BodyKey(1));

        player.tick(102.5, &mut body);
        assert_eq!(probe.borrow().position, Vec2::new(7.5, 0.0));

        player.tick(105.0, &mut body);
        assert_eq!(probe.borrow().position, Vec2::new(10.0, 0.0));
        assert_eq!(player.phase(), PlaybackPhase::Playing);
    }

    #[test]
    fn reaching_end_hands_body_to_physics() {
        let (fake, probe) = FakeBody::new(9, Vec2::ZERO);
        let mut body = TrackedBody::new(fake);
        let mut player = BranchPlayer::attach(&straight_branch(), 5.0, &mut body, BodyKey(1));

        assert_eq!(player.tick(25.0, &mut body), PlaybackPhase::Ended);
        let state = probe.borrow();
        assert_eq!(state.position, Vec2::new(20.0, 0.0));
        assert_eq!(state.rotation, 0.5);
        assert_eq!(state.velocity, Vec2::new(3.0, 1.0));
        assert!(state.simulated);
        assert!(state.collision_enabled);
        assert!(!state.ignored.contains(&BodyKey(1)));
    }

    #[test]
    fn ended_player_no_longer_drives_body() {
        let (fake, probe) = FakeBody::new(9, Vec2::ZERO);
        let mut body = TrackedBody::new(fake);
        let mut player = BranchPlayer::attach(&straight_branch(), 5.0, &mut body, BodyKey(1));
        player.tick(20.0, &mut body);

        probe.borrow_mut().position = Vec2::new(50.0, 50.0);
        assert_eq!(player.tick(6.0, &mut body), PlaybackPhase::Ended);
        assert_eq!(probe.borrow().position, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn target_time_clamps_before_spawn() {
        let (fake, _probe) = FakeBody::new(9, Vec2::ZERO);
        let mut body = TrackedBody::new(fake);
        let player = BranchPlayer::attach(&straight_branch(), 5.0, &mut body, BodyKey(1));
        assert_eq!(player.target_time(0.0), 5.0);
        assert_eq!(player.target_time(f64::NAN), 5.0);
        assert_eq!(player.target_time(500.0), 20.0);
    }
}
