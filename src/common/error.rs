//! Error types for the test runner engine
//!
//! Messages are written for the host's output panel: they say what failed
//! and what to check, without requiring engine internals to interpret.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the test runner engine
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("directory does not exist: {0}")]
    WorkingDirMissing(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration file: {0}")]
    ConfigParse(String),

    // === Spawn Errors ===
    #[error("cannot launch command '{command}': {reason}")]
    Launch { command: String, reason: String },

    // === Stream Errors ===
    #[error("malformed JSON in runner output: {0}")]
    Parse(String),

    #[error("truncated JSON value at end of runner output")]
    Truncated,

    // === Discovery Errors ===
    #[error("error parsing test list: {reason}. Check that the configured test runner is compatible")]
    Discovery { reason: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a spawn failure error
    pub fn launch(command: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::Launch {
            command: command.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a discovery error
    pub fn discovery(reason: impl std::fmt::Display) -> Self {
        Self::Discovery {
            reason: reason.to_string(),
        }
    }

    /// Whether a run should swallow this error: the run aborts, the host
    /// still receives a terminating run-finished notification, and nothing
    /// propagates. Stream-health errors are not in this set.
    pub fn aborts_run_silently(&self) -> bool {
        matches!(
            self,
            Self::WorkingDirMissing(_)
                | Self::Config(_)
                | Self::ConfigParse(_)
                | Self::Launch { .. }
        )
    }
}
