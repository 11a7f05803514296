//! Error types for the pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can stop a pipeline run.
///
/// Every variant is fatal for the run; nothing is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Filesystem error on a specific path.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed dataset row or header.
    #[error("dataset error: {0}")]
    Csv(#[from] csv::Error),

    /// Dataset header lacks a required column.
    #[error("dataset is missing required column `{0}`")]
    MissingColumn(String),

    /// Cache file exists but cannot be trusted. It has to be removed by hand.
    #[error("occurrence cache {path} is unreadable ({reason}); remove it to rebuild")]
    CacheCorrupt { path: PathBuf, reason: String },

    /// Cache file could not be written.
    #[error("failed to write occurrence cache {path}: {reason}")]
    CacheWrite { path: PathBuf, reason: String },

    /// Configuration file could not be parsed.
    #[error("invalid configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Nothing to analyze.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// A numeric backend failed or produced non-finite output.
    #[error("numeric stage failed: {0}")]
    Numeric(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
