//! Configuration errors raised while assembling a client.

use thiserror::Error;

/// Configuration-related errors.
///
/// Raised when a [`crate::config::FeedConfig`] or its credentials cannot be
/// turned into a working client. These never occur during a fetch.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// Required field is missing or empty
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Field has invalid value
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarMissing(String),

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
}

impl ConfigurationError {
    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
