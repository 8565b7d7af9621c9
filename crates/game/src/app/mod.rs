pub(crate) mod animation;
pub(crate) mod bootstrap;
pub(crate) mod gameplay;
pub(crate) mod loop_runner;
mod metrics;
pub(crate) mod physics;
pub(crate) mod scenario;
