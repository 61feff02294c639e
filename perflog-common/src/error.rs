use std::path::PathBuf;
use thiserror::Error;

/// Main error type for perflog
#[derive(Error, Debug)]
pub enum PerflogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed log {}: {reason}", .path.display())]
    MalformedLog { path: PathBuf, reason: String },

    #[error("Invalid workload key: {0}")]
    InvalidKey(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("External tool error: {0}")]
    External(String),
}

impl PerflogError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PerflogError::MalformedLog {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PerflogError>;
