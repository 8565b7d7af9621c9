use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::TimelineConfig;
use crate::digest::{hash_states, to_hex_lower};

use super::body::TrackedBody;
use super::branch::BranchArchive;
use super::clock::TimelineClock;
use super::events::{EventQueue, TimelineEvent};
use super::history::HistoryBuffer;
use super::object::{
    BranchReplica, IdAllocator, ObjectId, ReplicaId, RewindPass, TrackedObject,
    TrackedObjectDesc,
};
use super::pause::PauseSegment;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimelineStats {
    pub tracked_objects: usize,
    pub history_samples: usize,
    pub archived_branches: usize,
    pub live_replicas: usize,
    pub playing_replicas: usize,
    pub pause_segments: usize,
    pub rewinds: u64,
}

/// Owns the clocks and every tracked object, and drives recording, branch
/// playback and rewinds.
///
/// Each call runs to completion before returning. `rewind` takes `&mut self`,
/// so nothing reachable from a rewind can start another one.
#[derive(Debug)]
pub struct TimelineDirector {
    config: TimelineConfig,
    clock: TimelineClock,
    objects: Vec<TrackedObject>,
    object_ids: IdAllocator,
    replica_ids: IdAllocator,
    record_timer: f64,
    reset_requested: bool,
    rewinds: u64,
    events: EventQueue,
}

impl Default for TimelineDirector {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

impl TimelineDirector {
    /// `config` is expected to have passed [`TimelineConfig::validate`].
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            config,
            clock: TimelineClock::new(),
            objects: Vec::new(),
            object_ids: IdAllocator::default(),
            replica_ids: IdAllocator::default(),
            record_timer: 0.0,
            reset_requested: false,
            rewinds: 0,
            events: EventQueue::default(),
        }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn clock(&self) -> &TimelineClock {
        &self.clock
    }

    pub fn recording_time(&self) -> f64 {
        self.clock.recording_time()
    }

    pub fn branch_time(&self) -> f64 {
        self.clock.branch_time()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn pause_segments(&self) -> &[PauseSegment] {
        self.clock.pause_segments()
    }

    /// Starts tracking an entity. Its current state becomes the first sample.
    pub fn register(&mut self, desc: TrackedObjectDesc) -> ObjectId {
        let id = ObjectId(self.object_ids.allocate());
        let mut object = TrackedObject::new(id, desc, self.config.max_branches);
        object.record(self.clock.recording_time());
        debug!(
            object = object.debug_name(),
            id = id.0,
            branching = object.branching_enabled(),
            "timeline_object_registered"
        );
        self.objects.push(object);
        id
    }

    /// Stops tracking `id`, destroys its replicas and hands its body back.
    pub fn unregister(&mut self, id: ObjectId) -> Option<TrackedBody> {
        let index = self.objects.iter().position(|object| object.id() == id)?;
        let object = self.objects.remove(index);
        debug!(
            object = object.debug_name(),
            id = id.0,
            "timeline_object_unregistered"
        );
        Some(object.into_body(&mut self.events))
    }

    pub fn object(&self, id: ObjectId) -> Option<&TrackedObject> {
        self.objects.iter().find(|object| object.id() == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut TrackedObject> {
        self.objects.iter_mut().find(|object| object.id() == id)
    }

    pub fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }

    pub fn history(&self, id: ObjectId) -> Option<&HistoryBuffer> {
        self.object(id).map(TrackedObject::history)
    }

    pub fn archive(&self, id: ObjectId) -> Option<&BranchArchive> {
        self.object(id).map(TrackedObject::archive)
    }

    pub fn replicas(&self, id: ObjectId) -> Option<&[BranchReplica]> {
        self.object(id).map(TrackedObject::replicas)
    }

    /// Freezes the branch clock. Recording keeps going.
    pub fn pause(&mut self) -> bool {
        if !self.clock.pause() {
            return false;
        }
        let recording_time = self.clock.recording_time();
        info!(recording_time, "timeline_paused");
        self.events.push(TimelineEvent::PauseStateChanged {
            paused: true,
            recording_time,
        });
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.clock.resume() {
            return false;
        }
        let recording_time = self.clock.recording_time();
        info!(
            recording_time,
            pause_segments = self.clock.pause_segments().len(),
            "timeline_resumed"
        );
        self.events.push(TimelineEvent::PauseStateChanged {
            paused: false,
            recording_time,
        });
        true
    }

    /// One simulation step: pending reset, clocks, throttled recording, then
    /// branch playback.
    pub fn tick(&mut self, dt: f64) {
        if self.reset_requested {
            self.reset_reference();
        }

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.clock.advance(dt);

        self.record_timer += dt;
        if self.record_timer >= self.config.record_interval_seconds {
            self.record_timer = 0.0;
            self.record_all();
        }

        let branch_time = self.clock.branch_time();
        for object in &mut self.objects {
            object.tick_branch_playback(branch_time, &mut self.events);
        }
    }

    fn record_all(&mut self) {
        let now = self.clock.recording_time();
        let horizon = now - self.config.history_seconds;
        for object in &mut self.objects {
            object.record(now);
            object.trim_older_than(horizon);
        }
        self.clock.trim_segments_older_than(horizon);
    }

    /// Rewinds the world by `seconds`, archiving the abandoned future of every
    /// object as a branch and respawning one replica per archived branch.
    ///
    /// Non-positive or non-finite amounts are ignored.
    pub fn rewind(&mut self, seconds: f64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            debug!(seconds, "timeline_rewind_ignored");
            return;
        }

        let from_time = self.clock.recording_time();
        let to_time = (from_time - seconds).max(0.0);
        let pauses = self.clock.segments_for_branch(from_time);
        self.clock.rewind_to(to_time);

        let pass = RewindPass {
            from_time,
            to_time,
            spawn_branch_time: self.clock.branch_time(),
            pauses,
        };

        let mut branches_archived = 0usize;
        let mut replicas_spawned = 0usize;
        for object in &mut self.objects {
            let outcome = object.rewind(&pass, &mut self.replica_ids, &mut self.events);
            if outcome.archived {
                branches_archived += 1;
            }
            replicas_spawned += outcome.replicas_spawned;
        }

        let horizon = to_time - self.config.history_seconds;
        self.clock.trim_segments_to(to_time);
        self.clock.trim_segments_older_than(horizon);
        for object in &mut self.objects {
            object.trim_older_than(horizon);
        }
        self.record_timer = 0.0;
        self.rewinds = self.rewinds.saturating_add(1);

        info!(
            from_time,
            to_time,
            branches_archived,
            replicas_spawned,
            paused = self.clock.is_paused(),
            "timeline_rewind"
        );
        self.events.push(TimelineEvent::Rewound {
            from_time,
            to_time,
            branches_archived,
            replicas_spawned,
        });
    }

    /// Makes "now" the new time zero: both clocks, all pause state, every
    /// history, branch and replica are discarded, and each object is reseeded
    /// with its current state.
    pub fn reset_reference(&mut self) {
        self.reset_requested = false;
        let was_paused = self.clock.reset();
        self.record_timer = 0.0;

        if was_paused {
            self.events.push(TimelineEvent::PauseStateChanged {
                paused: false,
                recording_time: 0.0,
            });
        }
        for object in &mut self.objects {
            object.reset_timeline(0.0, &mut self.events);
        }

        info!(objects = self.objects.len(), "timeline_reference_reset");
        self.events.push(TimelineEvent::ReferenceReset);
    }

    /// Defers [`Self::reset_reference`] to the start of the next tick, after
    /// teleported bodies have settled.
    pub fn request_reset_reference(&mut self) {
        self.reset_requested = true;
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_requested
    }

    /// Destroys one replica, e.g. a ghost that wandered into a kill zone.
    pub fn despawn_replica(&mut self, replica: ReplicaId) -> bool {
        for object in &mut self.objects {
            if object.despawn_replica(replica, &mut self.events) {
                return true;
            }
        }
        false
    }

    pub fn drain_events(&mut self) -> Vec<TimelineEvent> {
        self.events.drain()
    }

    pub fn stats(&self) -> TimelineStats {
        let mut stats = TimelineStats {
            tracked_objects: self.objects.len(),
            pause_segments: self.clock.pause_segments().len(),
            rewinds: self.rewinds,
            ..TimelineStats::default()
        };
        for object in &self.objects {
            stats.history_samples += object.history().len();
            stats.archived_branches += object.archive().len();
            stats.live_replicas += object.replicas().len();
            stats.playing_replicas += object
                .replicas()
                .iter()
                .filter(|replica| replica.is_playing())
                .count();
        }
        stats
    }

    /// SHA-256 over the clocks, every history and every archived branch.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.clock.recording_time().to_bits().to_le_bytes());
        hasher.update(self.clock.branch_time().to_bits().to_le_bytes());
        for segment in self.clock.pause_segments() {
            hasher.update(segment.start.to_bits().to_le_bytes());
            hasher.update(segment.end.to_bits().to_le_bytes());
        }
        for object in &self.objects {
            hasher.update(object.id().0.to_le_bytes());
            hash_states(&mut hasher, object.history().states());
            for branch in object.archive().iter() {
                hash_states(&mut hasher, branch.states());
            }
        }
        to_hex_lower(&hasher.finalize())
    }
}
