use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("Run count must be at least 1 (got {runs})")]
    InvalidRunCount { runs: usize },

    #[error("Cannot compute statistics over zero samples")]
    EmptySamples,

    #[error("'{label}' failed on run {iteration}/{runs}: {detail}")]
    Execution {
        label: String,
        iteration: usize,
        runs: usize,
        detail: String,
    },

    #[error("Failed to remove output directory {path}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {detail}")]
    TomlParse { detail: String },

    #[error("Failed to parse config file {path}: {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },
}
