//! Error types for the herd_core library.

use crate::EarTag;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for herd_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected input: duplicate ear tag, unknown tag string, malformed record
    #[error("Validation error: {0}")]
    Validation(String),

    /// No calf carries the given ear tag
    #[error("Calf with ear tag {0} not found")]
    NotFound(EarTag),
}

impl Error {
    pub(crate) fn duplicate(ear_tag: EarTag) -> Self {
        Error::Validation(format!("Ear tag {} already exists", ear_tag))
    }
}
