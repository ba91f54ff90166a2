//! Crate-level error handling
//!
//! Startup and configuration failures surface through [`Error`] and abort
//! before any network activity. Per-attempt failures never use this type:
//! they are captured into an `AttemptResult` at the client boundary so a
//! single account can never abort a run.

use thiserror::Error;

/// Errors that abort startup or configuration loading
#[derive(Error, Debug)]
pub enum Error {
    /// Game id outside the supported set
    #[error("unknown game '{0}' (expected one of: hsr, gi, zzz, hi3)")]
    UnknownGame(String),

    /// Invalid configuration value
    #[error("config error: {0}")]
    Config(String),

    /// Credential file missing or malformed
    #[error("credential error: {0}")]
    Credential(String),

    /// HTTP client construction error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a credential error
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }
}

/// Result type alias using the crate-level [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
