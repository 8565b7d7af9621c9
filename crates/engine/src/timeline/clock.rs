use super::pause::PauseSegment;

/// The two logical clocks and the record of when branch playback was paused.
///
/// `recording_time` always advances with the simulation; `branch_time` only
/// advances while not paused. Both move backward solely through
/// [`TimelineClock::rewind_to`] and [`TimelineClock::reset`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineClock {
    recording_time: f64,
    branch_time: f64,
    paused_since: Option<f64>,
    pause_segments: Vec<PauseSegment>,
}

impl TimelineClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recording_time(&self) -> f64 {
        self.recording_time
    }

    pub fn branch_time(&self) -> f64 {
        self.branch_time
    }

    pub fn is_paused(&self) -> bool {
        self.paused_since.is_some()
    }

    pub fn paused_since(&self) -> Option<f64> {
        self.paused_since
    }

    /// Closed pause segments, oldest first. The open one is not included.
    pub fn pause_segments(&self) -> &[PauseSegment] {
        &self.pause_segments
    }

    /// Negative and non-finite steps are ignored.
    pub fn advance(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.recording_time += dt;
        if self.paused_since.is_none() {
            self.branch_time += dt;
        }
    }

    /// Returns `true` if this call paused the clock.
    pub fn pause(&mut self) -> bool {
        if self.paused_since.is_some() {
            return false;
        }
        self.paused_since = Some(self.recording_time);
        true
    }

    /// Returns `true` if this call resumed the clock.
    pub fn resume(&mut self) -> bool {
        let Some(start) = self.paused_since.take() else {
            return false;
        };
        self.close_segment(start, self.recording_time);
        true
    }

    /// Pause segments clipped to `up_to`, including the open one if paused.
    pub fn segments_for_branch(&self, up_to: f64) -> Vec<PauseSegment> {
        let mut segments: Vec<PauseSegment> = self
            .pause_segments
            .iter()
            .take_while(|segment| segment.start < up_to)
            .filter_map(|segment| PauseSegment::new(segment.start, segment.end.min(up_to)))
            .collect();

        if let Some(start) = self.paused_since {
            if let Some(open) = PauseSegment::new(start, up_to) {
                segments.push(open);
            }
        }
        segments
    }

    /// Moves both clocks to `to_time`. An open pause is closed at the old
    /// recording time and reopened at `to_time`.
    pub fn rewind_to(&mut self, to_time: f64) {
        let from_time = self.recording_time;
        let was_paused = match self.paused_since.take() {
            Some(start) => {
                self.close_segment(start, from_time);
                true
            }
            None => false,
        };

        self.recording_time = to_time;
        self.branch_time = to_time;

        if was_paused {
            self.paused_since = Some(to_time);
        }
    }

    /// Back to zero with no pause history. Returns whether it was paused.
    pub fn reset(&mut self) -> bool {
        let was_paused = self.paused_since.is_some();
        *self = Self::default();
        was_paused
    }

    /// Drops segments starting at or after `time` and clips the rest to end
    /// no later than `time`.
    pub fn trim_segments_to(&mut self, time: f64) {
        self.pause_segments.retain_mut(|segment| {
            if segment.start >= time {
                return false;
            }
            segment.end = segment.end.min(time);
            true
        });
    }

    /// Drops segments that ended before `older_than` and clips the rest to
    /// start no earlier than it.
    pub fn trim_segments_older_than(&mut self, older_than: f64) {
        self.pause_segments.retain_mut(|segment| {
            if segment.end < older_than {
                return false;
            }
            segment.start = segment.start.max(older_than);
            segment.start < segment.end
        });
    }

    fn close_segment(&mut self, start: f64, end: f64) {
        if let Some(segment) = PauseSegment::new(start, end) {
            self.pause_segments.push(segment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64) -> PauseSegment {
        PauseSegment::new(start, end).expect("segment")
    }

    #[test]
    fn branch_clock_freezes_while_paused() {
        let mut clock = TimelineClock::new();
        clock.advance(1.0);
        assert!(clock.pause());
        clock.advance(2.0);
        assert!(clock.resume());
        clock.advance(0.5);

        assert_eq!(clock.recording_time(), 3.5);
        assert_eq!(clock.branch_time(), 1.5);
        assert_eq!(clock.pause_segments(), &[segment(1.0, 3.0)]);
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let mut clock = TimelineClock::new();
        assert!(!clock.resume());
        assert!(clock.pause());
        assert!(!clock.pause());
        clock.advance(1.0);
        assert!(clock.resume());
        assert!(!clock.resume());
        assert_eq!(clock.pause_segments().len(), 1);
    }

    #[test]
    fn invalid_steps_are_ignored() {
        let mut clock = TimelineClock::new();
        clock.advance(-1.0);
        clock.advance(f64::NAN);
        clock.advance(f64::INFINITY);
        assert_eq!(clock.recording_time(), 0.0);
        assert_eq!(clock.branch_time(), 0.0);
    }

    #[test]
    fn segments_for_branch_clips_and_includes_open_pause() {
        let mut clock = TimelineClock::new();
        clock.advance(1.0);
        clock.pause();
        clock.advance(2.0);
        clock.resume();
        clock.advance(2.0);
        clock.pause();
        clock.advance(1.0);

        assert_eq!(
            clock.segments_for_branch(6.0),
            vec![segment(1.0, 3.0), segment(5.0, 6.0)]
        );
        assert_eq!(clock.segments_for_branch(2.0), vec![segment(1.0, 2.0)]);
    }

    #[test]
    fn rewind_reopens_pause_at_target() {
        let mut clock = TimelineClock::new();
        clock.advance(4.0);
        clock.pause();
        clock.advance(2.0);
        clock.rewind_to(1.0);

        assert!(clock.is_paused());
        assert_eq!(clock.paused_since(), Some(1.0));
        assert_eq!(clock.recording_time(), 1.0);
        assert_eq!(clock.branch_time(), 1.0);
        assert_eq!(clock.pause_segments(), &[segment(4.0, 6.0)]);

        clock.trim_segments_to(1.0);
        assert!(clock.pause_segments().is_empty());
    }

    #[test]
    fn trims_clip_segment_edges() {
        let mut clock = TimelineClock::new();
        clock.advance(1.0);
        clock.pause();
        clock.advance(4.0);
        clock.resume();

        let mut to_time = clock.clone();
        to_time.trim_segments_to(3.0);
        assert_eq!(to_time.pause_segments(), &[segment(1.0, 3.0)]);

        let mut older = clock.clone();
        older.trim_segments_older_than(2.0);
        assert_eq!(older.pause_segments(), &[segment(2.0, 5.0)]);
        older.trim_segments_older_than(6.0);
        assert!(older.pause_segments().is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut clock = TimelineClock::new();
        clock.advance(3.0);
        clock.pause();
        assert!(clock.reset());
        assert_eq!(clock, TimelineClock::new());
    }
}
