mod config;
mod digest;
pub mod timeline;

pub use config::{
    TimelineConfig, TimelineConfigError, MIN_HISTORY_SECONDS, MIN_RECORD_INTERVAL_SECONDS,
};
pub use digest::trajectory_digest;
pub use timeline::{
    AnimationSample, AnimationSource, BodyKey, BranchArchive, BranchData, BranchReplica,
    HistoryBuffer, ObjectId, PhysicsBody, ReplicaFactory, ReplicaId, SpriteFacing,
    TimelineDirector, TimelineEvent, TimelineState, TimelineStats, TrackedBody, TrackedObject,
    TrackedObjectDesc, Vec2, MAX_BRANCHES_LIMIT,
};
