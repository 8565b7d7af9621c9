use std::collections::VecDeque;

use tracing::warn;

use super::object::{ObjectId, ReplicaId};

const MAX_PENDING_TIMELINE_EVENTS: usize = 1024;

/// Notifications published once per state transition. Callers poll them with
/// `TimelineDirector::drain_events`.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    PauseStateChanged {
        paused: bool,
        recording_time: f64,
    },
    ReferenceReset,
    Rewound {
        from_time: f64,
        to_time: f64,
        branches_archived: usize,
        replicas_spawned: usize,
    },
    ReplicaSpawned {
        object: ObjectId,
        replica: ReplicaId,
    },
    ReplicaHandedOff {
        object: ObjectId,
        replica: ReplicaId,
    },
    ReplicaDestroyed {
        object: ObjectId,
        replica: ReplicaId,
    },
}

#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    pending: VecDeque<TimelineEvent>,
    overflow_warned: bool,
}

impl EventQueue {
    pub(crate) fn push(&mut self, event: TimelineEvent) {
        if self.pending.len() >= MAX_PENDING_TIMELINE_EVENTS {
            self.pending.pop_front();
            if !self.overflow_warned {
                self.overflow_warned = true;
                warn!(
                    capacity = MAX_PENDING_TIMELINE_EVENTS,
                    "timeline event queue full; dropping oldest events"
                );
            }
        }
        self.pending.push_back(event);
    }

    pub(crate) fn drain(&mut self) -> Vec<TimelineEvent> {
        self.overflow_warned = false;
        self.pending.drain(..).collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drops_oldest_when_full() {
        let mut queue = EventQueue::default();
        for index in 0..(MAX_PENDING_TIMELINE_EVENTS + 2) {
            queue.push(TimelineEvent::ReplicaSpawned {
                object: ObjectId(0),
                replica: ReplicaId(index as u64),
            });
        }
        assert_eq!(queue.len(), MAX_PENDING_TIMELINE_EVENTS);

        let drained = queue.drain();
        assert_eq!(
            drained.first(),
            Some(&TimelineEvent::ReplicaSpawned {
                object: ObjectId(0),
                replica: ReplicaId(2),
            })
        );
        assert_eq!(queue.len(), 0);
    }
}
