//! Payload decoding: verified body text to validated offers.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::record::{OfferRecord, RecordError};
use crate::config::PayloadLayout;

/// What to do when one raw offer fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Fail the whole batch with the first invalid entry (default)
    #[default]
    FailFast,
    /// Drop invalid entries and keep the rest
    SkipInvalid,
}

/// Errors raised while turning body text into offer records.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    /// Body text is not well-formed JSON
    #[error("Unable to parse json string: {source}. response string: {text}")]
    BodyNotJson {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured root object is missing
    #[error("No root element '{field}' found: {payload}")]
    NoRootContainer { field: String, payload: Value },

    /// The configured status field is missing or not an integer
    #[error("No status code element '{field}' found: {payload}")]
    NoStatusCode { field: String, payload: Value },

    /// The offers array is missing or not an array
    #[error("No offers entry '{field}' found: {payload}")]
    NoOffersField { field: String, payload: Value },

    /// An entry failed validation under [`BatchPolicy::FailFast`]
    #[error("Invalid offer at index {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: RecordError,
    },
}

impl DecodeError {
    /// Stable diagnostic code, shared with the fetch-level codes.
    ///
    /// Record failures have their own code space; see
    /// [`RecordError::error_code`].
    pub fn error_code(&self) -> Option<i32> {
        match self {
            DecodeError::BodyNotJson { .. } => Some(2),
            DecodeError::NoRootContainer { .. } => Some(3),
            DecodeError::NoStatusCode { .. } => Some(4),
            DecodeError::NoOffersField { .. } => Some(7),
            DecodeError::InvalidRecord { .. } => None,
        }
    }
}

/// Parse body text into a generic JSON value.
pub fn parse_payload(text: &str) -> Result<Value, DecodeError> {
    serde_json::from_str(text).map_err(|source| DecodeError::BodyNotJson {
        text: text.to_string(),
        source,
    })
}

/// Find the raw offers list inside `payload`.
pub fn locate_offers<'a>(
    payload: &'a Value,
    layout: &PayloadLayout,
) -> Result<&'a [Value], DecodeError> {
    let root = match &layout.root_field {
        Some(field) => payload
            .get(field)
            .filter(|root| root.is_object())
            .ok_or_else(|| DecodeError::NoRootContainer {
                field: field.clone(),
                payload: payload.clone(),
            })?,
        None => payload,
    };

    if let Some(field) = &layout.status_field {
        // The protocol publishes no code table, so only presence is checked.
        if root.get(field).and_then(Value::as_i64).is_none() {
            return Err(DecodeError::NoStatusCode {
                field: field.clone(),
                payload: payload.clone(),
            });
        }
    }

    root.get(&layout.offers_field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| DecodeError::NoOffersField {
            field: layout.offers_field.clone(),
            payload: payload.clone(),
        })
}

/// Validate every raw entry, preserving input order.
pub fn validate_offers(raw: &[Value], policy: BatchPolicy) -> Result<Vec<OfferRecord>, DecodeError> {
    let mut offers = Vec::with_capacity(raw.len());

    for (index, entry) in raw.iter().enumerate() {
        match OfferRecord::from_raw(entry) {
            Ok(offer) => offers.push(offer),
            Err(source) => match policy {
                BatchPolicy::FailFast => {
                    return Err(DecodeError::InvalidRecord { index, source });
                }
                BatchPolicy::SkipInvalid => {
                    warn!(index, code = source.error_code(), "Dropping invalid offer: {}", source);
                }
            },
        }
    }

    debug!(received = raw.len(), accepted = offers.len(), "Validated offers");
    Ok(offers)
}

/// Parse, locate and validate in one step.
pub fn decode_offers(
    text: &str,
    layout: &PayloadLayout,
    policy: BatchPolicy,
) -> Result<Vec<OfferRecord>, DecodeError> {
    let payload = parse_payload(text)?;
    let raw = locate_offers(&payload, layout)?;
    validate_offers(raw, policy)
}
