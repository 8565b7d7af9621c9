use super::sampler::{sample, TIME_EPSILON};
use super::state::TimelineState;

/// Time-ordered recording of one live object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryBuffer {
    states: Vec<TimelineState>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `state`. A state that does not advance past the newest one
    /// replaces it, keeping times strictly increasing.
    pub fn push(&mut self, state: TimelineState) {
        match self.states.last_mut() {
            Some(last) if state.time <= last.time => *last = state,
            _ => self.states.push(state),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[TimelineState] {
        &self.states
    }

    pub fn first(&self) -> Option<&TimelineState> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&TimelineState> {
        self.states.last()
    }

    pub fn sample(&self, t: f64) -> Option<TimelineState> {
        if self.states.is_empty() {
            None
        } else {
            Some(sample(&self.states, t))
        }
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Evicts the prefix recorded before `older_than`. The newest state is
    /// always retained.
    pub fn trim_older_than(&mut self, older_than: f64) -> usize {
        let keep_from = self
            .states
            .partition_point(|state| state.time < older_than)
            .min(self.states.len().saturating_sub(1));
        self.states.drain(..keep_from);
        keep_from
    }

    /// Drops every state recorded after `time`.
    pub fn truncate_after(&mut self, time: f64) -> usize {
        let keep = self.states.partition_point(|state| state.time <= time);
        let removed = self.states.len() - keep;
        self.states.truncate(keep);
        removed
    }

    /// Copies the recorded span `[start, end]`, clamped to the recorded range,
    /// with boundary states sampled so the copy begins and ends exactly on the
    /// window edges. Returns `None` for fewer than two states or a window
    /// narrower than the sampling epsilon.
    pub fn extract_window(&self, start: f64, end: f64) -> Option<Vec<TimelineState>> {
        if self.states.len() < 2 {
            return None;
        }

        let first = self.states[0].time;
        let last = self.states[self.states.len() - 1].time;
        let end = end.clamp(first, last);
        let start = start.clamp(first, end);
        if end - start <= TIME_EPSILON {
            return None;
        }

        let mut window = Vec::with_capacity(self.states.len() + 2);
        window.push(sample(&self.states, start));
        window.extend(
            self.states
                .iter()
                .filter(|state| state.time > start && state.time < end)
                .copied(),
        );
        window.push(sample(&self.states, end));
        Some(window)
    }
}
