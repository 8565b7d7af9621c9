use super::sampler::{sample, TIME_EPSILON};
use super::state::TimelineState;

/// Half-open `[start, end)` interval on the recording clock during which
/// branch playback was frozen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseSegment {
    pub start: f64,
    pub end: f64,
}

impl PauseSegment {
    /// Returns `None` unless both ends are finite and `start < end`.
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if start.is_finite() && end.is_finite() && start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Sorts segments by start and merges any that overlap or touch.
pub fn normalize_pause_segments(pauses: &[PauseSegment]) -> Vec<PauseSegment> {
    let mut sorted = pauses.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<PauseSegment> = Vec::with_capacity(sorted.len());
    for segment in sorted {
        match merged.last_mut() {
            Some(previous) if segment.start <= previous.end => {
                previous.end = previous.end.max(segment.end);
            }
            _ => merged.push(segment),
        }
    }
    merged
}

/// Freezes every paused span of `source`.
///
/// Each overlapping segment is replaced by two samples carrying the state at
/// the segment start: one stamped at the start, one at the end. Samples
/// strictly inside a segment are dropped, everything else is kept verbatim.
/// If the result would hold fewer than two states, `source` is returned as is.
pub fn apply_pause_segments(
    source: &[TimelineState],
    pauses: &[PauseSegment],
) -> Vec<TimelineState> {
    if source.len() < 2 || pauses.is_empty() {
        return source.to_vec();
    }

    let start_time = source[0].time;
    let end_time = source[source.len() - 1].time;
    let mut result: Vec<TimelineState> = Vec::with_capacity(source.len() + 2);
    let mut index = 0usize;

    for pause in normalize_pause_segments(pauses) {
        if pause.end <= start_time || pause.start >= end_time {
            continue;
        }

        let segment_start = pause.start.max(start_time);
        let segment_end = pause.end.min(end_time);
        if segment_end <= segment_start {
            continue;
        }

        while index < source.len() && source[index].time < segment_start {
            result.push(source[index]);
            index += 1;
        }

        let frozen = sample(source, segment_start);
        push_or_replace(&mut result, frozen);

        while index < source.len() && source[index].time <= segment_end {
            index += 1;
        }

        push_or_replace(&mut result, frozen.with_time(segment_end));
    }

    result.extend_from_slice(&source[index..]);

    if result.len() >= 2 {
        result
    } else {
        source.to_vec()
    }
}

fn push_or_replace(result: &mut Vec<TimelineState>, state: TimelineState) {
    match result.last_mut() {
        Some(last) if (last.time - state.time).abs() < TIME_EPSILON => *last = state,
        Some(last) if last.time > state.time => {}
        _ => result.push(state),
    }
}
