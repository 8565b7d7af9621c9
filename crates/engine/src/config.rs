use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timeline::MAX_BRANCHES_LIMIT;

pub const MIN_RECORD_INTERVAL_SECONDS: f64 = 0.01;
pub const MIN_HISTORY_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimelineConfig {
    /// Minimum spacing between two recorded samples.
    pub record_interval_seconds: f64,
    /// How far back histories, branches and pause segments are kept.
    pub history_seconds: f64,
    /// Branch capacity for objects that do not set their own.
    pub max_branches: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            record_interval_seconds: 0.02,
            history_seconds: 30.0,
            max_branches: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum TimelineConfigError {
    #[error("failed to read timeline config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse timeline config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("record_interval_seconds must be a finite value >= {min}, got {actual}")]
    RecordInterval { min: f64, actual: f64 },
    #[error("history_seconds must be a finite value >= {min}, got {actual}")]
    HistorySeconds { min: f64, actual: f64 },
    #[error("max_branches must be <= {max}, got {actual}")]
    MaxBranches { max: usize, actual: usize },
}

impl TimelineConfig {
    pub fn validate(&self) -> Result<(), TimelineConfigError> {
        if !self.record_interval_seconds.is_finite()
            || self.record_interval_seconds < MIN_RECORD_INTERVAL_SECONDS
        {
            return Err(TimelineConfigError::RecordInterval {
                min: MIN_RECORD_INTERVAL_SECONDS,
                actual: self.record_interval_seconds,
            });
        }
        if !self.history_seconds.is_finite() || self.history_seconds < MIN_HISTORY_SECONDS {
            return Err(TimelineConfigError::HistorySeconds {
                min: MIN_HISTORY_SECONDS,
                actual: self.history_seconds,
            });
        }
        if self.max_branches > MAX_BRANCHES_LIMIT {
            return Err(TimelineConfigError::MaxBranches {
                max: MAX_BRANCHES_LIMIT,
                actual: self.max_branches,
            });
        }
        Ok(())
    }

    pub fn from_json_str(raw: &str, path: &Path) -> Result<Self, TimelineConfigError> {
        let config = serde_json::from_str::<Self>(raw).map_err(|source| {
            TimelineConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, TimelineConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| TimelineConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        TimelineConfig::default().validate().expect("valid default");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = TimelineConfig::from_json_str(
            r#"{ "history_seconds": 12.5 }"#,
            Path::new("inline.json"),
        )
        .expect("config");
        assert_eq!(config.history_seconds, 12.5);
        assert_eq!(config.record_interval_seconds, 0.02);
        assert_eq!(config.max_branches, 10);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let too_fast = TimelineConfig {
            record_interval_seconds: 0.001,
            ..TimelineConfig::default()
        };
        assert!(matches!(
            too_fast.validate(),
            Err(TimelineConfigError::RecordInterval { .. })
        ));

        let too_short = TimelineConfig {
            history_seconds: f64::NAN,
            ..TimelineConfig::default()
        };
        assert!(matches!(
            too_short.validate(),
            Err(TimelineConfigError::HistorySeconds { .. })
        ));

        let too_many = TimelineConfig {
            max_branches: 11,
            ..TimelineConfig::default()
        };
        assert!(matches!(
            too_many.validate(),
            Err(TimelineConfigError::MaxBranches { max: 10, actual: 11 })
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let result =
            TimelineConfig::from_json_str(r#"{ "rewind_speed": 2.0 }"#, Path::new("x.json"));
        assert!(matches!(result, Err(TimelineConfigError::Parse { .. })));
    }

    #[test]
    fn loads_from_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("timeline.json");
        fs::write(
            &path,
            r#"{ "record_interval_seconds": 0.05, "history_seconds": 5, "max_branches": 2 }"#,
        )
        .expect("write config");

        let config = TimelineConfig::load_from_path(&path).expect("config");
        assert_eq!(config.record_interval_seconds, 0.05);
        assert_eq!(config.history_seconds, 5.0);
        assert_eq!(config.max_branches, 2);
    }

    #[test]
    fn missing_file_reports_path() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("missing.json");
        let error = TimelineConfig::load_from_path(&path).expect_err("missing file");
        assert!(error.to_string().contains("missing.json"));
    }
}
