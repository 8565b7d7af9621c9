//! Record, rewind and branch replay for a set of physics-driven entities.

mod body;
mod branch;
mod clock;
mod director;
mod events;
mod history;
mod math;
mod object;
mod pause;
mod player;
mod sampler;
mod state;
#[cfg(test)]
pub(crate) mod test_support;

pub use body::{AnimationSource, BodyKey, PhysicsBody, ReplicaFactory, SpriteFacing, TrackedBody};
pub use branch::{BranchArchive, BranchData, MAX_BRANCHES_LIMIT};
pub use clock::TimelineClock;
pub use director::{TimelineDirector, TimelineStats};
pub use events::TimelineEvent;
pub use history::HistoryBuffer;
pub use math::{lerp, lerp_angle, Vec2};
pub use object::{BranchReplica, ObjectId, ReplicaId, TrackedObject, TrackedObjectDesc};
pub use pause::{apply_pause_segments, normalize_pause_segments, PauseSegment};
pub use player::{BranchPlayer, PlaybackPhase};
pub use sampler::{interpolate, sample, TIME_EPSILON};
pub use state::{AnimationSample, TimelineState};
