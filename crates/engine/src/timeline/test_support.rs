use std::cell::RefCell;
use std::rc::Rc;

use super::body::{
    AnimationSource, BodyKey, PhysicsBody, ReplicaFactory, SpriteFacing, TrackedBody,
};
use super::math::Vec2;
use super::state::{AnimationSample, TimelineState};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeBodyState {
    pub key: BodyKey,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub simulated: bool,
    pub collision_enabled: bool,
    pub ignored: Vec<BodyKey>,
    pub destroyed: bool,
}

pub(crate) type Probe = Rc<RefCell<FakeBodyState>>;

pub(crate) struct FakeBody {
    state: Probe,
}

impl FakeBody {
    pub(crate) fn new(key: u64, position: Vec2) -> (Self, Probe) {
        let state = Rc::new(RefCell::new(FakeBodyState {
            key: BodyKey(key),
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            simulated: true,
            collision_enabled: true,
            ignored: Vec::new(),
            destroyed: false,
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl PhysicsBody for FakeBody {
    fn body_key(&self) -> BodyKey {
        self.state.borrow().key
    }

    fn position(&self) -> Vec2 {
        self.state.borrow().position
    }

    fn rotation(&self) -> f32 {
        self.state.borrow().rotation
    }

    fn velocity(&self) -> Vec2 {
        self.state.borrow().velocity
    }

    fn angular_velocity(&self) -> f32 {
        self.state.borrow().angular_velocity
    }

    fn set_position(&mut self, position: Vec2) {
        self.state.borrow_mut().position = position;
    }

    fn set_rotation(&mut self, rotation: f32) {
        self.state.borrow_mut().rotation = rotation;
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.state.borrow_mut().velocity = velocity;
    }

    fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.state.borrow_mut().angular_velocity = angular_velocity;
    }

    fn set_simulated(&mut self, simulated: bool) {
        self.state.borrow_mut().simulated = simulated;
    }

    fn collision_enabled(&self) -> bool {
        self.state.borrow().collision_enabled
    }

    fn set_collision_enabled(&mut self, enabled: bool) {
        self.state.borrow_mut().collision_enabled = enabled;
    }

    fn ignore_collision_with(&mut self, other: BodyKey, ignore: bool) {
        let mut state = self.state.borrow_mut();
        state.ignored.retain(|key| *key != other);
        if ignore {
            state.ignored.push(other);
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeAnimatorState {
    pub current: Option<AnimationSample>,
    pub custom_scalar: Option<f32>,
    pub flip_x: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeAnimator {
    pub state: Rc<RefCell<FakeAnimatorState>>,
}

impl AnimationSource for FakeAnimator {
    fn current_state(&self) -> Option<AnimationSample> {
        self.state.borrow().current
    }

    fn play(&mut self, state_id: u32, normalized_time: f32) {
        let mut state = self.state.borrow_mut();
        let looping = state.current.map(|current| current.looping).unwrap_or(false);
        state.current = Some(AnimationSample {
            state_id,
            normalized_time,
            looping,
        });
    }

    fn custom_scalar(&self) -> Option<f32> {
        self.state.borrow().custom_scalar
    }

    fn set_custom_scalar(&mut self, value: f32) {
        self.state.borrow_mut().custom_scalar = Some(value);
    }
}

impl SpriteFacing for FakeAnimator {
    fn flip_x(&self) -> bool {
        self.state.borrow().flip_x
    }

    fn set_flip_x(&mut self, flip_x: bool) {
        self.state.borrow_mut().flip_x = flip_x;
    }
}

/// Hands out fake replica bodies and remembers every one it made.
#[derive(Clone, Default)]
pub(crate) struct FakeFactory {
    pub spawned: Rc<RefCell<Vec<Probe>>>,
}

impl FakeFactory {
    pub(crate) fn live_count(&self) -> usize {
        self.spawned
            .borrow()
            .iter()
            .filter(|probe| !probe.borrow().destroyed)
            .count()
    }

    pub(crate) fn live_probes(&self) -> Vec<Probe> {
        self.spawned
            .borrow()
            .iter()
            .filter(|probe| !probe.borrow().destroyed)
            .cloned()
            .collect()
    }
}

impl ReplicaFactory for FakeFactory {
    fn spawn_replica(&mut self, initial: &TimelineState) -> TrackedBody {
        let key = 1000 + self.spawned.borrow().len() as u64;
        let (body, probe) = FakeBody::new(key, initial.position);
        self.spawned.borrow_mut().push(probe);
        TrackedBody::new(body)
    }

    fn destroy_replica(&mut self, replica: TrackedBody) {
        let key = replica.key();
        for probe in self.spawned.borrow().iter() {
            if probe.borrow().key == key {
                probe.borrow_mut().destroyed = true;
            }
        }
    }
}
