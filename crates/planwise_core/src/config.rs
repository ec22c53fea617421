//! Planner configuration.
//!
//! # Responsibility
//! - Hold tunables for risk windows, accuracy tolerance and expansion caps.
//! - Load configuration from TOML with defaults for every missing key.
//!
//! # Invariants
//! - Unknown keys are rejected so typos do not silently fall back to defaults.
//! - A config returned by `load`/`from_toml_str` has passed `validate()`.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_AT_RISK_WINDOW_DAYS: u32 = 2;
const DEFAULT_ACCURACY_TOLERANCE_PERCENT: f64 = 10.0;
const DEFAULT_MAX_OCCURRENCES_PER_EXPANSION: usize = 366;

/// Configuration loading/validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Logging section of the planner config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            directory: None,
        }
    }
}

/// Tunables for the scheduling core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    /// Tasks due within this many days after today are classified at-risk.
    pub at_risk_window_days: u32,
    /// Overall accuracy within `100 +/- tolerance` percent counts as accurate.
    pub accuracy_tolerance_percent: f64,
    /// Upper bound on occurrences produced by one expansion call.
    pub max_occurrences_per_expansion: usize,
    pub logging: LoggingConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            at_risk_window_days: DEFAULT_AT_RISK_WINDOW_DAYS,
            accuracy_tolerance_percent: DEFAULT_ACCURACY_TOLERANCE_PERCENT,
            max_occurrences_per_expansion: DEFAULT_MAX_OCCURRENCES_PER_EXPANSION,
            logging: LoggingConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.accuracy_tolerance_percent.is_finite() || self.accuracy_tolerance_percent < 0.0 {
            return Err(ConfigError::Invalid {
                field: "accuracy_tolerance_percent",
                reason: format!(
                    "must be a finite, non-negative number, got {}",
                    self.accuracy_tolerance_percent
                ),
            });
        }
        if self.max_occurrences_per_expansion == 0 {
            return Err(ConfigError::Invalid {
                field: "max_occurrences_per_expansion",
                reason: "must be >= 1".to_string(),
            });
        }
        if let Some(directory) = &self.logging.directory {
            if !directory.is_absolute() {
                return Err(ConfigError::Invalid {
                    field: "logging.directory",
                    reason: format!("must be an absolute path, got `{}`", directory.display()),
                });
            }
        }
        Ok(())
    }
}
