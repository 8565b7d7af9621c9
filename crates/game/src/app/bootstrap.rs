use std::path::PathBuf;
use std::time::Duration;

use rewind_engine::TimelineConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::Level;
use super::loop_runner::LoopConfig;
use super::scenario::{Scenario, SCENARIO_ENV_VAR};

const TIMELINE_CONFIG_ENV_VAR: &str = "REWIND_TIMELINE_CONFIG";

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) timeline_config: TimelineConfig,
    pub(crate) scenario: Scenario,
    pub(crate) level: Level,
}

pub(crate) fn build_app() -> Result<AppWiring, String> {
    init_tracing();
    info!("=== Rewind Demo Startup ===");

    let timeline_config = match env_path(TIMELINE_CONFIG_ENV_VAR) {
        Some(path) => TimelineConfig::load_from_path(&path).map_err(|error| error.to_string())?,
        None => TimelineConfig::default(),
    };
    let scenario = match env_path(SCENARIO_ENV_VAR) {
        Some(path) => Scenario::load_from_path(&path)?,
        None => Scenario::builtin()?,
    };
    info!(
        record_interval_seconds = timeline_config.record_interval_seconds,
        history_seconds = timeline_config.history_seconds,
        max_branches = timeline_config.max_branches,
        scenario = scenario.name.as_str(),
        steps = scenario.steps.len(),
        "startup"
    );

    let run_duration = Duration::try_from_secs_f64(scenario.duration_seconds)
        .map_err(|error| format!("scenario '{}' duration: {error}", scenario.name))?;
    let loop_config = LoopConfig {
        run_duration,
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        loop_config,
        timeline_config,
        scenario,
        level: Level::demo(),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}
