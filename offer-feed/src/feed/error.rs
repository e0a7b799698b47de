//! Fetch error types.

use std::time::Duration;

use thiserror::Error;

use super::signer::Signature;
use crate::error::{ErrorCategory, ErrorClassification};
use crate::offers::{DecodeError, OfferRecord, RecordError};

/// Terminal result of one fetch.
pub type FetchOutcome = Result<Vec<OfferRecord>, FetchError>;

/// Errors that end a fetch.
///
/// Each variant carries the raw material needed for a diagnostic message
/// (bytes, text, parsed payload or the offending entry).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FetchError {
    /// Network, DNS or TLS failure, or the body could not be read
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an empty body
    #[error("No json response returned from server")]
    EmptyResponseBody,

    /// The body is not valid UTF-8
    #[error("Unable to parse response into string ({len} bytes)", len = .bytes.len())]
    BodyNotText { bytes: Vec<u8> },

    /// Verification is on and the signature header is absent
    #[error("No response signature found in header '{header}'")]
    SignatureHeaderMissing { header: String },

    /// Verification is on and the header does not match the body
    #[error("Invalid response signature in header. expected: {expected}, actual: {actual}")]
    SignatureMismatch { expected: Signature, actual: String },

    /// The verified body could not be decoded into offers
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl FetchError {
    /// Stable diagnostic code, as published by the feed's mobile client.
    ///
    /// Transport errors and record failures return `None`; use
    /// [`FetchError::record_error`] for the latter.
    pub fn error_code(&self) -> Option<i32> {
        match self {
            FetchError::Transport(_) => None,
            FetchError::EmptyResponseBody => Some(0),
            FetchError::BodyNotText { .. } => Some(1),
            FetchError::SignatureHeaderMissing { .. } => Some(5),
            FetchError::SignatureMismatch { .. } => Some(6),
            FetchError::Decode(e) => e.error_code(),
        }
    }

    /// The record failure behind an invalid batch, if any.
    pub fn record_error(&self) -> Option<&RecordError> {
        match self {
            FetchError::Decode(DecodeError::InvalidRecord { source, .. }) => Some(source),
            _ => None,
        }
    }

    /// Returns true if the response failed integrity checks.
    pub fn is_signature_error(&self) -> bool {
        matches!(
            self,
            FetchError::SignatureHeaderMissing { .. } | FetchError::SignatureMismatch { .. }
        )
    }
}

impl ErrorClassification for FetchError {
    fn category(&self) -> ErrorCategory {
        match self {
            FetchError::Transport(_) => ErrorCategory::Transient,
            FetchError::EmptyResponseBody => ErrorCategory::Transient,
            FetchError::BodyNotText { .. } => ErrorCategory::Permanent,
            // A wrong API key or endpoint, not a flaky network
            FetchError::SignatureHeaderMissing { .. } => ErrorCategory::Configuration,
            FetchError::SignatureMismatch { .. } => ErrorCategory::Configuration,
            FetchError::Decode(_) => ErrorCategory::Permanent,
        }
    }

    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            FetchError::Transport(e) if e.is_timeout() => Some(Duration::from_secs(2)),
            FetchError::Transport(_) => Some(Duration::from_secs(1)),
            FetchError::EmptyResponseBody => Some(Duration::from_millis(500)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::decode_offers;
    use crate::config::PayloadLayout;
    use crate::offers::BatchPolicy;

    #[test]
    fn test_error_codes() {
        assert_eq!(FetchError::EmptyResponseBody.error_code(), Some(0));
        assert_eq!(FetchError::BodyNotText { bytes: vec![0xff] }.error_code(), Some(1));
        assert_eq!(
            FetchError::SignatureHeaderMissing {
                header: "X-Sig".to_string()
            }
            .error_code(),
            Some(5)
        );

        let err: FetchError = decode_offers("{}", &PayloadLayout::default(), BatchPolicy::FailFast)
            .unwrap_err()
            .into();
        assert_eq!(err.error_code(), Some(7));
        assert!(err.record_error().is_none());
    }

    #[test]
    fn test_record_error_is_reachable() {
        let err: FetchError = decode_offers(
            r#"{"offers":[{"title":"T"}]}"#,
            &PayloadLayout::default(),
            BatchPolicy::FailFast,
        )
        .unwrap_err()
        .into();
        assert_eq!(err.error_code(), None);
        assert!(matches!(
            err.record_error(),
            Some(RecordError::MissingTeaser { .. })
        ));
        assert!(err.is_permanent());
    }

    #[test]
    fn test_signature_errors_are_configuration() {
        let err = FetchError::SignatureMismatch {
            expected: Signature::digest("body"),
            actual: "0000".to_string(),
        };
        assert!(err.is_signature_error());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.max_retries(), 0);
        assert!(err.to_string().contains("actual: 0000"));
    }

    #[test]
    fn test_empty_body_is_transient() {
        let err = FetchError::EmptyResponseBody;
        assert!(err.is_transient());
        assert_eq!(err.suggested_retry_delay(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_body_not_text_message() {
        let err = FetchError::BodyNotText {
            bytes: vec![0xc3, 0x28, 0xa0],
        };
        assert_eq!(err.to_string(), "Unable to parse response into string (3 bytes)");
    }
}
