use std::env;
use std::process::ExitCode;
use std::time::Duration;

use rewind_engine::{TimelineDirector, TimelineStats};
use serde::Serialize;
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;
use super::gameplay::{PlatformerScene, SceneCounters};
use super::metrics::MetricsAccumulator;

pub(crate) const SLOW_FRAME_ENV_VAR: &str = "REWIND_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub(crate) struct LoopConfig {
    pub(crate) target_tps: u32,
    /// Simulated wall-clock length of one rendered frame.
    pub(crate) frame_time: Duration,
    pub(crate) max_frame_delta: Duration,
    pub(crate) max_ticks_per_frame: u32,
    pub(crate) metrics_log_interval: Duration,
    pub(crate) simulated_slow_frame_ms: u64,
    pub(crate) run_duration: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            frame_time: Duration::from_micros(16_667),
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            run_duration: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RunReport {
    pub(crate) scenario: String,
    pub(crate) ticks: u64,
    pub(crate) frames: u64,
    pub(crate) dropped_backlog_ms: f64,
    pub(crate) scene_seconds: f64,
    pub(crate) recording_time: f64,
    pub(crate) branch_time: f64,
    pub(crate) stats: TimelineStats,
    pub(crate) counters: SceneCounters,
    pub(crate) digest: String,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let mut timeline = TimelineDirector::new(app.timeline_config);
    let mut scene = PlatformerScene::load(app.level, &app.scenario, &mut timeline);
    let slow_frame_delay = resolve_slow_frame_delay(app.loop_config.simulated_slow_frame_ms);
    let mut report = run_headless(&app.loop_config, slow_frame_delay, &mut scene, &mut timeline);
    report.scenario = app.scenario.name;

    info!(
        ticks = report.ticks,
        frames = report.frames,
        rewinds = report.stats.rewinds,
        archived_branches = report.stats.archived_branches,
        digest = report.digest.as_str(),
        "run_complete"
    );

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run_report_encode_failed");
            ExitCode::FAILURE
        }
    }
}

/// Drives `scene` with a fixed-step accumulator over simulated frames until
/// `run_duration` of frame time has elapsed. Each frame lasts `frame_time`
/// plus `slow_frame_delay`.
pub(crate) fn run_headless(
    config: &LoopConfig,
    slow_frame_delay: Duration,
    scene: &mut PlatformerScene,
    timeline: &mut TimelineDirector,
) -> RunReport {
    let target_tps = config.target_tps.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f64();
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let frame_time = normalize_non_zero_duration(config.frame_time, fixed_dt);
    info!(
        target_tps,
        max_ticks_per_frame,
        frame_ms = frame_time.as_secs_f64() * 1000.0,
        slow_frame_ms = slow_frame_delay.as_millis() as u64,
        run_seconds = config.run_duration.as_secs_f64(),
        "loop_config"
    );

    let mut metrics = MetricsAccumulator::new(metrics_log_interval);
    let mut accumulator = Duration::ZERO;
    let mut run_clock = Duration::ZERO;
    let mut dropped_backlog = Duration::ZERO;
    let mut ticks = 0u64;
    let mut frames = 0u64;

    while run_clock < config.run_duration {
        let frame_dt =
            clamp_frame_delta(frame_time.saturating_add(slow_frame_delay), max_frame_delta);
        run_clock = run_clock.saturating_add(frame_dt);
        accumulator = accumulator.saturating_add(frame_dt);
        metrics.record_frame(frame_dt);
        frames = frames.saturating_add(1);

        let plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        accumulator = plan.remaining_accumulator;
        if !plan.dropped_backlog.is_zero() {
            dropped_backlog = dropped_backlog.saturating_add(plan.dropped_backlog);
            warn!(
                dropped_ms = plan.dropped_backlog.as_secs_f64() * 1000.0,
                ticks_run = plan.ticks_to_run,
                "sim_backlog_dropped"
            );
        }

        for _ in 0..plan.ticks_to_run {
            scene.tick(fixed_dt_seconds, timeline);
            metrics.record_tick();
            ticks = ticks.saturating_add(1);
        }

        if let Some(snapshot) = metrics.maybe_snapshot(run_clock) {
            let stats = timeline.stats();
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                recording_time = timeline.recording_time(),
                branch_time = timeline.branch_time(),
                paused = timeline.is_paused(),
                history_samples = stats.history_samples,
                archived_branches = stats.archived_branches,
                live_replicas = stats.live_replicas,
                "loop_metrics"
            );
        }
    }

    RunReport {
        scenario: String::new(),
        ticks,
        frames,
        dropped_backlog_ms: dropped_backlog.as_secs_f64() * 1000.0,
        scene_seconds: scene.elapsed_seconds(),
        recording_time: timeline.recording_time(),
        branch_time: timeline.branch_time(),
        stats: timeline.stats(),
        counters: scene.counters(),
        digest: timeline.digest(),
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}
