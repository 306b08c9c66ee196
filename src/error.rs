// src/error.rs

use std::fmt;
use thiserror::Error;

/// Core error types for depsync
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The distribution service returned no identifier or version, or a fetch failed
    #[error("Resolution error: {0}")]
    ResolutionError(String),

    /// Malformed manifest document
    #[error("Manifest parse error: {0}")]
    ManifestParseError(String),

    /// Transport-level failure talking to the distribution service
    #[error("Request error: {0}")]
    RequestError(String),

    /// Failed to construct a client or worker pool
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error with context
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Result type alias using depsync's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal conditions surfaced at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// No alias could be found for a package; its identifier is used instead
    AliasNotFound { package_id: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::AliasNotFound { package_id } => write!(
                f,
                "No alias found for package {}, using the identifier as its alias",
                package_id
            ),
        }
    }
}
