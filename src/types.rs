use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Native acceleration toggle passed to the tool under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccelerationMode {
    On,
    Off,
}

impl AccelerationMode {
    /// Value written to the acceleration environment variable.
    pub fn env_value(self) -> &'static str {
        match self {
            AccelerationMode::On => "true",
            AccelerationMode::Off => "false",
        }
    }
}

/// What to do when the output directory exists but cannot be removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CleanupPolicy {
    /// Log a warning and keep measuring.
    #[default]
    Warn,
    /// Fail the whole benchmark.
    Abort,
}

/// One command under measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub label: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<AccelerationMode>,
}

impl Target {
    pub fn new(label: &str, command: &str, acceleration: Option<AccelerationMode>) -> Self {
        Target {
            label: label.to_string(),
            command: command.to_string(),
            acceleration,
        }
    }
}
