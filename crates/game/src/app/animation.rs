use std::cell::RefCell;
use std::rc::Rc;

use rewind_engine::{AnimationSample, AnimationSource, SpriteFacing};

pub(crate) const CLIP_IDLE: u32 = 0;
pub(crate) const CLIP_RUN: u32 = 1;
pub(crate) const CLIP_JUMP: u32 = 2;

const RUN_CLIP_SECONDS: f32 = 0.6;
const IDLE_CLIP_SECONDS: f32 = 1.2;
const JUMP_CLIP_SECONDS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AnimatorState {
    pub(crate) clip: AnimationSample,
    pub(crate) vertical_speed: f32,
    pub(crate) flip_x: bool,
}

impl Default for AnimatorState {
    fn default() -> Self {
        Self {
            clip: clip_sample(CLIP_IDLE, 0.0),
            vertical_speed: 0.0,
            flip_x: false,
        }
    }
}

/// Clip player plus sprite facing for one character. Clones share state, so
/// the scene drives it while the timeline records and restores it.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpriteAnimator {
    state: Rc<RefCell<AnimatorState>>,
}

impl SpriteAnimator {
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> AnimatorState {
        *self.state.borrow()
    }

    /// Advances `clip` by `dt`, restarting it if the clip changed.
    pub(crate) fn drive(&self, clip: u32, dt: f32, vertical_speed: f32, facing: Option<bool>) {
        let mut state = self.state.borrow_mut();
        let normalized_time = if state.clip.state_id == clip {
            state.clip.normalized_time + dt / clip_seconds(clip)
        } else {
            0.0
        };
        state.clip = clip_sample(clip, normalized_time);
        state.vertical_speed = vertical_speed;
        if let Some(flip_x) = facing {
            state.flip_x = flip_x;
        }
    }
}

impl AnimationSource for SpriteAnimator {
    fn current_state(&self) -> Option<AnimationSample> {
        Some(self.state.borrow().clip)
    }

    fn play(&mut self, state_id: u32, normalized_time: f32) {
        self.state.borrow_mut().clip = clip_sample(state_id, normalized_time);
    }

    fn custom_scalar(&self) -> Option<f32> {
        Some(self.state.borrow().vertical_speed)
    }

    fn set_custom_scalar(&mut self, value: f32) {
        self.state.borrow_mut().vertical_speed = value;
    }
}

impl SpriteFacing for SpriteAnimator {
    fn flip_x(&self) -> bool {
        self.state.borrow().flip_x
    }

    fn set_flip_x(&mut self, flip_x: bool) {
        self.state.borrow_mut().flip_x = flip_x;
    }
}

fn clip_sample(state_id: u32, normalized_time: f32) -> AnimationSample {
    AnimationSample {
        state_id,
        normalized_time,
        looping: state_id != CLIP_JUMP,
    }
}

fn clip_seconds(clip: u32) -> f32 {
    match clip {
        CLIP_RUN => RUN_CLIP_SECONDS,
        CLIP_JUMP => JUMP_CLIP_SECONDS,
        _ => IDLE_CLIP_SECONDS,
    }
}
