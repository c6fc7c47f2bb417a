//! Error types for batch, config and dataset operations
//!
//! Every failure carries the key, path or split that caused it so the CLI can
//! print a message the user can act on without re-running in verbose mode.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for tanda operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, persisting or building batches
#[derive(Debug, Error)]
pub enum Error {
    /// Generic configuration problem (bad shape, bad value)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A key required at construction time is absent
    #[error("Missing required config key: {key}")]
    MissingKey { key: String },

    /// A build or batch configuration failed validation
    #[error("Invalid configuration: {0}")]
    Validation(#[from] crate::config::ValidationError),

    /// A configuration group could not be resolved by the composer
    #[error("Config group not found: {group} (looked in {path})")]
    GroupNotFound { group: String, path: PathBuf },

    /// Filesystem failure with the path that caused it
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The split loader produced no table
    #[error("Loader returned no table for split '{split}'")]
    EmptySplit { split: String },

    /// A loaded table lacks declared key or data columns
    #[error("Missing columns {missing:?} in {path}")]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    /// A pipeline references a step that is not registered
    #[error("Unknown pipeline step: {0}")]
    UnknownStep(String),

    /// A pipeline step failed
    #[error("Pipeline step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    /// Table file extension has no reader/writer
    #[error("Unsupported table format: {0}")]
    UnsupportedFormat(String),

    /// A model artifact could not be found at the given location
    #[error("Model not found: {location}")]
    ModelNotFound { location: String },

    /// Any other error reported by an external model service
    #[error("Model service error: {0}")]
    Service(String),

    /// IO error without path context
    #[error("IO error: {0}")]
    StdIo(#[from] std::io::Error),

    /// YAML parsing or serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing or serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid file pattern
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    /// Create an IO error with the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Shorthand for a missing configuration key.
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Check if this error stems from configuration rather than runtime data
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_)
                | Self::MissingKey { .. }
                | Self::Validation(_)
                | Self::GroupNotFound { .. }
                | Self::UnknownStep(_)
                | Self::Yaml(_)
        )
    }

    /// Stable error code for structured output
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "E001",
            Self::MissingKey { .. } => "E002",
            Self::GroupNotFound { .. } => "E003",
            Self::UnknownStep(_) => "E004",
            Self::Validation(_) => "E005",
            Self::Io { .. } | Self::StdIo(_) => "E010",
            Self::Yaml(_) | Self::Json(_) | Self::Csv(_) => "E011",
            Self::Pattern(_) => "E012",
            Self::EmptySplit { .. } => "E020",
            Self::MissingColumns { .. } => "E021",
            Self::StepFailed { .. } => "E022",
            Self::UnsupportedFormat(_) => "E023",
            Self::ModelNotFound { .. } => "E030",
            Self::Service(_) => "E031",
        }
    }
}
