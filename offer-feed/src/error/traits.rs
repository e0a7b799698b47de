//! Error classification for retry decisions.
//!
//! The feed core never retries on its own. These traits let errors describe
//! themselves so the caller can decide whether to re-invoke a fetch.

use std::time::Duration;

use super::common::ConfigurationError;

/// Classification of error types for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient errors that may resolve on retry (network issues, timeouts)
    Transient,
    /// Permanent errors that won't resolve on retry (malformed payloads)
    Permanent,
    /// Configuration errors (wrong key, wrong endpoint)
    Configuration,
    /// Internal errors (bugs, unexpected state)
    Internal,
}

/// Trait for errors that can classify themselves for retry logic.
///
/// # Example
///
/// ```rust,ignore
/// use offer_feed::error::ErrorClassification;
///
/// match client.fetch_once(&options).await {
///     Ok(offers) => show(offers),
///     Err(e) if e.is_transient() => schedule_refresh(e.suggested_retry_delay()),
///     Err(e) => show_error(e),
/// }
/// ```
pub trait ErrorClassification {
    /// Returns the category of this error
    fn category(&self) -> ErrorCategory;

    /// Returns true if this error is transient and may succeed on retry
    fn is_transient(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transient)
    }

    /// Returns true if this error is permanent and won't succeed on retry
    fn is_permanent(&self) -> bool {
        matches!(self.category(), ErrorCategory::Permanent)
    }

    /// Suggests a delay before retrying, if applicable
    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self.category() {
            ErrorCategory::Transient => Some(Duration::from_secs(1)),
            _ => None,
        }
    }

    /// Returns the maximum number of retries suggested for this error
    fn max_retries(&self) -> u32 {
        match self.category() {
            ErrorCategory::Transient => 3,
            _ => 0,
        }
    }
}

impl ErrorClassification for ConfigurationError {
    fn category(&self) -> ErrorCategory {
        match self {
            ConfigurationError::HttpClient(_) => ErrorCategory::Internal,
            _ => ErrorCategory::Configuration,
        }
    }

    fn suggested_retry_delay(&self) -> Option<Duration> {
        None
    }

    fn max_retries(&self) -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_never_retry() {
        let err = ConfigurationError::MissingField("request.appid".to_string());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(!err.is_transient());
        assert!(!err.is_permanent());
        assert_eq!(err.suggested_retry_delay(), None);
        assert_eq!(err.max_retries(), 0);
    }

    #[test]
    fn test_http_client_error_is_internal() {
        let err = ConfigurationError::HttpClient("tls backend unavailable".to_string());
        assert_eq!(err.category(), ErrorCategory::Internal);
    }
}
