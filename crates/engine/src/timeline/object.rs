use std::fmt;

use tracing::debug;

use super::body::{ReplicaFactory, TrackedBody};
use super::branch::{BranchArchive, BranchData};
use super::events::{EventQueue, TimelineEvent};
use super::history::HistoryBuffer;
use super::pause::{apply_pause_segments, PauseSegment};
use super::player::{BranchPlayer, PlaybackPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplicaId(pub u64);

#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Everything needed to start tracking a world entity.
pub struct TrackedObjectDesc {
    pub debug_name: &'static str,
    pub body: TrackedBody,
    pub replicas: Option<Box<dyn ReplicaFactory>>,
    pub max_branches: Option<usize>,
}

impl TrackedObjectDesc {
    pub fn new(debug_name: &'static str, body: TrackedBody) -> Self {
        Self {
            debug_name,
            body,
            replicas: None,
            max_branches: None,
        }
    }

    /// Enables branching: abandoned futures get archived and replayed by
    /// replicas built with `factory`.
    pub fn with_replicas(mut self, factory: impl ReplicaFactory + 'static) -> Self {
        self.replicas = Some(Box::new(factory));
        self
    }

    pub fn with_max_branches(mut self, max_branches: usize) -> Self {
        self.max_branches = Some(max_branches);
        self
    }
}

/// A spawned ghost. While its player is attached the body is script-driven;
/// afterwards it is an ordinary physics object until the owner rewinds again.
#[derive(Debug)]
pub struct BranchReplica {
    id: ReplicaId,
    body: TrackedBody,
    player: Option<BranchPlayer>,
}

impl BranchReplica {
    pub fn id(&self) -> ReplicaId {
        self.id
    }

    pub fn body(&self) -> &TrackedBody {
        &self.body
    }

    pub fn player(&self) -> Option<&BranchPlayer> {
        self.player.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_some()
    }
}

pub(crate) struct RewindPass {
    pub(crate) from_time: f64,
    pub(crate) to_time: f64,
    pub(crate) spawn_branch_time: f64,
    pub(crate) pauses: Vec<PauseSegment>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RewindOutcome {
    pub(crate) archived: bool,
    pub(crate) replicas_spawned: usize,
}

pub struct TrackedObject {
    id: ObjectId,
    debug_name: &'static str,
    body: TrackedBody,
    history: HistoryBuffer,
    archive: BranchArchive,
    replicas: Vec<BranchReplica>,
    factory: Option<Box<dyn ReplicaFactory>>,
}

impl TrackedObject {
    pub(crate) fn new(id: ObjectId, desc: TrackedObjectDesc, default_max_branches: usize) -> Self {
        let capacity = desc.max_branches.unwrap_or(default_max_branches);
        Self {
            id,
            debug_name: desc.debug_name,
            body: desc.body,
            history: HistoryBuffer::new(),
            archive: BranchArchive::with_capacity(capacity),
            replicas: Vec::new(),
            factory: desc.replicas,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn debug_name(&self) -> &'static str {
        self.debug_name
    }

    pub fn body(&self) -> &TrackedBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut TrackedBody {
        &mut self.body
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn archive(&self) -> &BranchArchive {
        &self.archive
    }

    pub fn replicas(&self) -> &[BranchReplica] {
        &self.replicas
    }

    pub fn branching_enabled(&self) -> bool {
        self.factory.is_some() && self.archive.capacity() > 0
    }

    pub(crate) fn record(&mut self, time: f64) {
        self.history.push(self.body.capture(time));
    }

    pub(crate) fn rewind(
        &mut self,
        pass: &RewindPass,
        replica_ids: &mut IdAllocator,
        events: &mut EventQueue,
    ) -> RewindOutcome {
        if self.history.len() < 2 {
            return RewindOutcome::default();
        }

        let archived = self.archive_abandoned_future(pass);

        if let Some(snapped) = self.history.sample(pass.to_time) {
            self.body.apply_live(&snapped);
            self.history.truncate_after(pass.to_time);
            let ends_early = self
                .history
                .last()
                .map_or(true, |last| last.time < pass.to_time);
            if ends_early {
                self.history.push(snapped.with_time(pass.to_time));
            }
        }

        self.destroy_replicas(events);
        let replicas_spawned = self.spawn_replicas(pass.spawn_branch_time, replica_ids, events);

        RewindOutcome {
            archived,
            replicas_spawned,
        }
    }

    fn archive_abandoned_future(&mut self, pass: &RewindPass) -> bool {
        if !self.branching_enabled() {
            return false;
        }
        let Some(window) = self.history.extract_window(pass.to_time, pass.from_time) else {
            return false;
        };
        let Some(branch) = BranchData::new(apply_pause_segments(&window, &pass.pauses)) else {
            return false;
        };

        debug!(
            object = self.debug_name,
            recording_start = branch.recording_start(),
            recording_end = branch.recording_end(),
            state_count = branch.states().len(),
            "branch_archived"
        );
        let evicted = self.archive.push(branch);
        if !evicted.is_empty() {
            debug!(
                object = self.debug_name,
                evicted = evicted.len(),
                "branch_evicted"
            );
        }
        true
    }

    fn spawn_replicas(
        &mut self,
        spawn_branch_time: f64,
        replica_ids: &mut IdAllocator,
        events: &mut EventQueue,
    ) -> usize {
        let Some(factory) = self.factory.as_mut() else {
            return 0;
        };
        let source = self.body.key();

        for branch in self.archive.iter() {
            let mut body = factory.spawn_replica(&branch.states()[0]);
            let player = BranchPlayer::attach(branch, spawn_branch_time, &mut body, source);
            let replica = ReplicaId(replica_ids.allocate());
            self.replicas.push(BranchReplica {
                id: replica,
                body,
                player: Some(player),
            });
            events.push(TimelineEvent::ReplicaSpawned {
                object: self.id,
                replica,
            });
        }
        self.replicas.len()
    }

    pub(crate) fn tick_branch_playback(&mut self, branch_time: f64, events: &mut EventQueue) {
        for replica in &mut self.replicas {
            let Some(player) = replica.player.as_mut() else {
                continue;
            };
            if player.tick(branch_time, &mut replica.body) == PlaybackPhase::Ended {
                replica.player = None;
                debug!(
                    object = self.debug_name,
                    replica = replica.id.0,
                    "replica_handed_off"
                );
                events.push(TimelineEvent::ReplicaHandedOff {
                    object: self.id,
                    replica: replica.id,
                });
            }
        }
    }

    pub(crate) fn destroy_replicas(&mut self, events: &mut EventQueue) {
        for replica in std::mem::take(&mut self.replicas) {
            self.destroy_replica(replica, events);
        }
    }

    pub(crate) fn despawn_replica(&mut self, replica: ReplicaId, events: &mut EventQueue) -> bool {
        let Some(index) = self.replicas.iter().position(|entry| entry.id == replica) else {
            return false;
        };
        let removed = self.replicas.remove(index);
        self.destroy_replica(removed, events);
        true
    }

    fn destroy_replica(&mut self, replica: BranchReplica, events: &mut EventQueue) {
        let BranchReplica { id, body, .. } = replica;
        if let Some(factory) = self.factory.as_mut() {
            factory.destroy_replica(body);
        }
        events.push(TimelineEvent::ReplicaDestroyed {
            object: self.id,
            replica: id,
        });
    }

    /// Forgets all recorded time and reseeds the history at `time`.
    pub(crate) fn reset_timeline(&mut self, time: f64, events: &mut EventQueue) {
        self.destroy_replicas(events);
        self.history.clear();
        self.archive.clear();
        self.record(time);
    }

    pub(crate) fn trim_older_than(&mut self, older_than: f64) {
        self.history.trim_older_than(older_than);
        self.archive.evict_older_than(older_than);
    }

    pub(crate) fn into_body(mut self, events: &mut EventQueue) -> TrackedBody {
        self.destroy_replicas(events);
        self.body
    }
}

impl fmt::Debug for TrackedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedObject")
            .field("id", &self.id)
            .field("debug_name", &self.debug_name)
            .field("history_len", &self.history.len())
            .field("branches", &self.archive.len())
            .field("replicas", &self.replicas.len())
            .field("branching_enabled", &self.branching_enabled())
            .finish()
    }
}
