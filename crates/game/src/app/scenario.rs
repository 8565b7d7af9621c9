use std::fmt::Display;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub(crate) const SCENARIO_ENV_VAR: &str = "REWIND_SCENARIO";

const MAX_SCENARIO_SECONDS: f64 = 3600.0;

const BUILTIN_SCENARIO_JSON: &str = include_str!("../../scenarios/demo.json");

pub(crate) type ScenarioResult<T> = Result<T, String>;

/// Scripted input for a headless run, keyed by scene time (which, unlike the
/// timeline clocks, never rewinds).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    pub(crate) name: String,
    pub(crate) duration_seconds: f64,
    #[serde(default)]
    pub(crate) steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScenarioStep {
    pub(crate) at_seconds: f64,
    pub(crate) action: ScenarioAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub(crate) enum ScenarioAction {
    Run { direction: f32 },
    Stop,
    Jump,
    Rewind { seconds: f64 },
    Pause,
    Resume,
    Freeze { seconds: f64 },
    Respawn,
}

impl Scenario {
    pub(crate) fn builtin() -> ScenarioResult<Self> {
        Self::from_json_str(BUILTIN_SCENARIO_JSON)
    }

    pub(crate) fn load_from_path(path: &Path) -> ScenarioResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|error| format!("read scenario '{}': {error}", path.display()))?;
        Self::from_json_str(&raw)
            .map_err(|error| format!("scenario '{}': {error}", path.display()))
    }

    pub(crate) fn from_json_str(raw: &str) -> ScenarioResult<Self> {
        let scenario = parse_scenario_json(raw)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> ScenarioResult<()> {
        if !self.duration_seconds.is_finite()
            || self.duration_seconds <= 0.0
            || self.duration_seconds > MAX_SCENARIO_SECONDS
        {
            return Err(expected_actual(
                "duration_seconds",
                format!("a number in (0, {MAX_SCENARIO_SECONDS}]"),
                self.duration_seconds,
            ));
        }

        let mut previous = 0.0;
        for (index, step) in self.steps.iter().enumerate() {
            let at_path = format!("steps[{index}].at_seconds");
            if !step.at_seconds.is_finite() || step.at_seconds < 0.0 {
                return Err(expected_actual(&at_path, "a non-negative number", step.at_seconds));
            }
            if step.at_seconds < previous {
                return Err(expected_actual(
                    &at_path,
                    format!(">= {previous}"),
                    step.at_seconds,
                ));
            }
            previous = step.at_seconds;

            let action_path = format!("steps[{index}].action");
            match step.action {
                ScenarioAction::Run { direction }
                    if !direction.is_finite() || direction.abs() > 1.0 =>
                {
                    return Err(expected_actual(
                        &format!("{action_path}.direction"),
                        "a value in [-1, 1]",
                        direction,
                    ));
                }
                ScenarioAction::Rewind { seconds } | ScenarioAction::Freeze { seconds }
                    if !seconds.is_finite() || seconds <= 0.0 =>
                {
                    return Err(expected_actual(
                        &format!("{action_path}.seconds"),
                        "a positive number",
                        seconds,
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn parse_scenario_json(raw: &str) -> ScenarioResult<Scenario> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, Scenario>(&mut deserializer) {
        Ok(scenario) => Ok(scenario),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse scenario json: {source}"))
            } else {
                Err(format!("parse scenario json at {path}: {source}"))
            }
        }
    }
}

fn validation_err(path: &str, message: impl Into<String>) -> String {
    format!("validation failed at {path}: {}", message.into())
}

fn expected_actual(path: &str, expected: impl Display, actual: impl Display) -> String {
    validation_err(path, format!("expected {expected}, got {actual}"))
}

/// Hands out scenario actions in order as scene time passes.
#[derive(Debug, Clone)]
pub(crate) struct ScenarioCursor {
    steps: Vec<ScenarioStep>,
    next: usize,
}

impl ScenarioCursor {
    pub(crate) fn new(scenario: &Scenario) -> Self {
        Self {
            steps: scenario.steps.clone(),
            next: 0,
        }
    }

    pub(crate) fn take_due(&mut self, elapsed_seconds: f64) -> Vec<ScenarioAction> {
        let due = self.steps[self.next..]
            .iter()
            .take_while(|step| step.at_seconds <= elapsed_seconds)
            .map(|step| step.action)
            .collect::<Vec<_>>();
        self.next += due.len();
        due
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.next >= self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn builtin_scenario_parses_and_validates() {
        let scenario = Scenario::builtin().expect("builtin scenario");
        assert!(!scenario.steps.is_empty());
        assert!(scenario
            .steps
            .iter()
            .any(|step| matches!(step.action, ScenarioAction::Rewind { .. })));
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = r#"{
            "name": "bad",
            "duration_seconds": 3.0,
            "steps": [
                { "at_seconds": 0.0, "action": { "kind": "jump" } },
                { "at_seconds": 1.0, "action": { "kind": "rewind", "seconds": "two" } }
            ]
        }"#;
        let error = Scenario::from_json_str(raw).expect_err("type error");
        assert!(error.contains("steps[1].action"), "{error}");
    }

    #[test]
    fn unknown_action_kind_is_rejected() {
        let raw = r#"{ "name": "x", "duration_seconds": 1.0,
            "steps": [ { "at_seconds": 0.0, "action": { "kind": "teleport" } } ] }"#;
        assert!(Scenario::from_json_str(raw).is_err());
    }

    #[test]
    fn validation_rejects_out_of_order_steps() {
        let raw = r#"{ "name": "x", "duration_seconds": 5.0, "steps": [
            { "at_seconds": 2.0, "action": { "kind": "jump" } },
            { "at_seconds": 1.0, "action": { "kind": "stop" } }
        ] }"#;
        let error = Scenario::from_json_str(raw).expect_err("order");
        assert!(error.contains("steps[1].at_seconds"), "{error}");
    }

    #[test]
    fn validation_rejects_non_positive_rewind() {
        let raw = r#"{ "name": "x", "duration_seconds": 5.0, "steps": [
            { "at_seconds": 1.0, "action": { "kind": "rewind", "seconds": 0.0 } }
        ] }"#;
        let error = Scenario::from_json_str(raw).expect_err("rewind");
        assert!(error.contains("steps[0].action.seconds"), "{error}");
    }

    #[test]
    fn validation_rejects_unbounded_duration() {
        let raw = r#"{ "name": "x", "duration_seconds": 1e20, "steps": [] }"#;
        let error = Scenario::from_json_str(raw).expect_err("duration");
        assert!(error.contains("duration_seconds"), "{error}");
    }

    #[test]
    fn load_from_path_reads_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("scenario.json");
        fs::write(
            &path,
            r#"{ "name": "short", "duration_seconds": 2.0, "steps": [
                { "at_seconds": 0.5, "action": { "kind": "run", "direction": -1.0 } }
            ] }"#,
        )
        .expect("write scenario");

        let scenario = Scenario::load_from_path(&path).expect("scenario");
        assert_eq!(scenario.name, "short");
        assert_eq!(
            scenario.steps[0].action,
            ScenarioAction::Run { direction: -1.0 }
        );
    }

    #[test]
    fn cursor_releases_each_step_once() {
        let scenario = Scenario {
            name: "cursor".to_string(),
            duration_seconds: 3.0,
            steps: vec![
                ScenarioStep {
                    at_seconds: 0.0,
                    action: ScenarioAction::Jump,
                },
                ScenarioStep {
                    at_seconds: 1.0,
                    action: ScenarioAction::Pause,
                },
                ScenarioStep {
                    at_seconds: 1.0,
                    action: ScenarioAction::Resume,
                },
            ],
        };
        let mut cursor = ScenarioCursor::new(&scenario);
        assert_eq!(cursor.take_due(0.5), vec![ScenarioAction::Jump]);
        assert!(cursor.take_due(0.9).is_empty());
        assert_eq!(
            cursor.take_due(1.0),
            vec![ScenarioAction::Pause, ScenarioAction::Resume]
        );
        assert!(cursor.is_finished());
        assert!(cursor.take_due(10.0).is_empty());
    }
}
