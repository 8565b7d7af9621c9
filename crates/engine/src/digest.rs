use sha2::{Digest, Sha256};

use crate::timeline::{AnimationSample, TimelineState};

/// Feeds every field of every state into `hasher` bit-for-bit, so two runs
/// only hash equal if they recorded identical trajectories.
pub(crate) fn hash_states(hasher: &mut Sha256, states: &[TimelineState]) {
    hasher.update((states.len() as u64).to_le_bytes());
    for state in states {
        hasher.update(state.time.to_bits().to_le_bytes());
        hasher.update(state.position.x.to_bits().to_le_bytes());
        hasher.update(state.position.y.to_bits().to_le_bytes());
        hasher.update(state.rotation.to_bits().to_le_bytes());
        hasher.update(state.velocity.x.to_bits().to_le_bytes());
        hasher.update(state.velocity.y.to_bits().to_le_bytes());
        hasher.update(state.angular_velocity.to_bits().to_le_bytes());
        hash_animation(hasher, state.animation);
        match state.sprite_flip_x {
            Some(flip_x) => hasher.update([1u8, flip_x as u8]),
            None => hasher.update([0u8]),
        }
        match state.custom_scalar {
            Some(value) => {
                hasher.update([1u8]);
                hasher.update(value.to_bits().to_le_bytes());
            }
            None => hasher.update([0u8]),
        }
    }
}

fn hash_animation(hasher: &mut Sha256, animation: Option<AnimationSample>) {
    match animation {
        Some(sample) => {
            hasher.update([1u8, sample.looping as u8]);
            hasher.update(sample.state_id.to_le_bytes());
            hasher.update(sample.normalized_time.to_bits().to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
}

/// Hex digest of a single trajectory.
pub fn trajectory_digest(states: &[TimelineState]) -> String {
    let mut hasher = Sha256::new();
    hash_states(&mut hasher, states);
    to_hex_lower(&hasher.finalize())
}

pub(crate) fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Vec2;

    fn states() -> Vec<TimelineState> {
        vec![
            TimelineState::at_rest(0.0, Vec2::new(0.0, 0.0)),
            TimelineState::at_rest(1.0, Vec2::new(1.0, 0.0)).with_sprite_flip_x(true),
        ]
    }

    #[test]
    fn digest_is_stable_and_hex() {
        let first = trajectory_digest(&states());
        assert_eq!(first, trajectory_digest(&states()));
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_changes_with_any_field() {
        let base = trajectory_digest(&states());

        let mut moved = states();
        moved[1].position.y = 1e-6;
        assert_ne!(base, trajectory_digest(&moved));

        let mut unflipped = states();
        unflipped[1].sprite_flip_x = None;
        assert_ne!(base, trajectory_digest(&unflipped));
    }
}
