//! Error types for the pulse_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pulse_core operations
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

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Rejected input (e.g. a username that is too short)
    #[error("{0}")]
    Validation(String),

    /// Username already taken
    #[error("{0}")]
    Duplicate(String),

    /// User lookup miss
    #[error("{0}")]
    NotFound(String),

    /// The record store could not be read or written
    #[error("{0}")]
    Persistence(String),

    /// Imported document is not valid structured data
    #[error("Invalid import document: {0}")]
    Parse(String),

    /// State management error
    #[error("State error: {0}")]
    State(String),
}

impl Error {
    /// True for errors caused by the caller's input rather than the environment.
    ///
    /// These leave all existing state untouched.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Duplicate(_) | Error::NotFound(_) | Error::Parse(_)
        )
    }
}
