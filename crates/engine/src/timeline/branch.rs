use std::collections::VecDeque;

use super::state::TimelineState;

pub const MAX_BRANCHES_LIMIT: usize = 10;

/// An abandoned stretch of history, frozen at rewind time.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchData {
    states: Vec<TimelineState>,
    recording_start: f64,
    recording_end: f64,
}

impl BranchData {
    /// Returns `None` for fewer than two states.
    pub fn new(states: Vec<TimelineState>) -> Option<Self> {
        if states.len() < 2 {
            return None;
        }
        let recording_start = states[0].time;
        let recording_end = states[states.len() - 1].time;
        Some(Self {
            states,
            recording_start,
            recording_end,
        })
    }

    pub fn states(&self) -> &[TimelineState] {
        &self.states
    }

    pub fn recording_start(&self) -> f64 {
        self.recording_start
    }

    pub fn recording_end(&self) -> f64 {
        self.recording_end
    }

    pub fn duration(&self) -> f64 {
        self.recording_end - self.recording_start
    }
}

/// FIFO ring of branches; the oldest is evicted once `capacity` is reached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchArchive {
    branches: VecDeque<BranchData>,
    capacity: usize,
}

impl BranchArchive {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_BRANCHES_LIMIT);
        Self {
            branches: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Archives `branch` and returns whatever fell out of the ring. With a
    /// capacity of zero the branch itself is handed back.
    pub fn push(&mut self, branch: BranchData) -> Vec<BranchData> {
        if self.capacity == 0 {
            return vec![branch];
        }
        self.branches.push_back(branch);
        let overflow = self.branches.len().saturating_sub(self.capacity);
        self.branches.drain(..overflow).collect()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &BranchData> {
        self.branches.iter()
    }

    pub fn clear(&mut self) {
        self.branches.clear();
    }

    /// Evicts branches that ended before `older_than`.
    pub fn evict_older_than(&mut self, older_than: f64) -> usize {
        let before = self.branches.len();
        self.branches.retain(|branch| branch.recording_end >= older_than);
        before - self.branches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::math::Vec2;

    fn branch(start: f64, end: f64) -> BranchData {
        BranchData::new(vec![
            TimelineState::at_rest(start, Vec2::ZERO),
            TimelineState::at_rest(end, Vec2::new(1.0, 0.0)),
        ])
        .expect("branch")
    }

    #[test]
    fn branch_requires_two_states() {
        assert!(BranchData::new(vec![TimelineState::at_rest(0.0, Vec2::ZERO)]).is_none());
        let data = branch(1.0, 4.0);
        assert_eq!(data.recording_start(), 1.0);
        assert_eq!(data.recording_end(), 4.0);
        assert_eq!(data.duration(), 3.0);
    }

    #[test]
    fn archive_keeps_most_recent_branches() {
        let mut archive = BranchArchive::with_capacity(3);
        for index in 0..7 {
            archive.push(branch(index as f64, index as f64 + 1.0));
            assert!(archive.len() <= 3);
        }
        let starts: Vec<f64> = archive.iter().map(BranchData::recording_start).collect();
        assert_eq!(starts, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn push_reports_evicted_branch() {
        let mut archive = BranchArchive::with_capacity(1);
        assert!(archive.push(branch(0.0, 1.0)).is_empty());
        let evicted = archive.push(branch(1.0, 2.0));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].recording_start(), 0.0);
    }

    #[test]
    fn zero_capacity_archives_nothing() {
        let mut archive = BranchArchive::with_capacity(0);
        assert_eq!(archive.push(branch(0.0, 1.0)).len(), 1);
        assert!(archive.is_empty());
    }

    #[test]
    fn capacity_is_capped() {
        assert_eq!(BranchArchive::with_capacity(64).capacity(), MAX_BRANCHES_LIMIT);
    }

    #[test]
    fn horizon_eviction_drops_whole_branches() {
        let mut archive = BranchArchive::with_capacity(4);
        archive.push(branch(0.0, 2.0));
        archive.push(branch(1.0, 5.0));
        assert_eq!(archive.evict_older_than(3.0), 1);
        assert_eq!(archive.iter().next().map(BranchData::recording_end), Some(5.0));
    }
}
