//! Error types for the replay engine.
//!
//! Malformed log lines are not errors: the extractor skips them. Only a
//! failure to obtain the raw text, a bad config file, or a dead session
//! surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain the raw log text.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: PathBuf },
}

/// Errors from the replay session control surface.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// The load attempt failed; the previous timeline is untouched.
    #[error("load failed: {0}")]
    LoadFailed(#[from] SourceError),

    /// The session actor has shut down.
    #[error("replay session closed")]
    SessionClosed,
}

/// Errors loading a [`ReplayConfig`](crate::config::ReplayConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, ReplayError>;
