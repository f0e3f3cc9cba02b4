// Copyright 2026 Hypermesh Foundation. All rights reserved.
// What-If Pricing Simulator - Configuration

//! Session configuration, loaded from an optional TOML file.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::types::VersionLabels;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("configuration file {path}: {reason}")]
    File { path: PathBuf, reason: String },
}

// ─── Log Level ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive for `tracing_subscriber::EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

// ─── SimConfig ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Directory holding the baseline, saved scenarios and the registry.
    pub data_dir: PathBuf,
    pub baseline_file: String,
    pub registry_file: String,
    pub baseline_label: String,
    pub simulation_label: String,
    pub log_level: LogLevel,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            baseline_file: "Baseline.csv".to_string(),
            registry_file: "simulations.csv".to_string(),
            baseline_label: "Baseline".to_string(),
            simulation_label: "Simulation".to_string(),
            log_level: LogLevel::Info,
        }
    }
}

impl SimConfig {
    /// Defaults, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p).map_err(|e| ConfigError::File {
                    path: p.to_path_buf(),
                    reason: e.to_string(),
                })?;
                Self::from_toml(&text).map_err(|e| match e {
                    ConfigError::File { reason, .. } => ConfigError::File { path: p.to_path_buf(), reason },
                    other => other,
                })?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::File {
            path: PathBuf::new(),
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_labels(&self.labels())?;
        for (field, value) in [
            ("baseline_file", &self.baseline_file),
            ("registry_file", &self.registry_file),
        ] {
            if value.is_empty() || value.contains(&['/', '\\'][..]) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value:?} must be a plain file name"),
                });
            }
        }
        Ok(())
    }

    pub fn labels(&self) -> VersionLabels {
        VersionLabels {
            baseline: self.baseline_label.clone(),
            simulation: self.simulation_label.clone(),
        }
    }
}

/// Labels must be non-blank and distinct.
pub fn validate_labels(labels: &VersionLabels) -> Result<(), ConfigError> {
    for (field, value) in [
        ("baseline_label", &labels.baseline),
        ("simulation_label", &labels.simulation),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid { field, reason: "must not be empty".to_string() });
        }
    }
    if labels.baseline == labels.simulation {
        return Err(ConfigError::Invalid {
            field: "simulation_label",
            reason: format!("must differ from baseline_label ({:?})", labels.baseline),
        });
    }
    Ok(())
}
