//! Validated offer records.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

/// Why a raw offer entry was rejected.
///
/// Every variant carries the offending entry so the caller can show a
/// diagnostic without keeping the payload around.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RecordError {
    /// `title` missing, not a string, or empty
    #[error("No title entry found in offer: {entry}")]
    MissingTitle { entry: Value },

    /// `teaser` missing, not a string, or empty
    #[error("No teaser entry found in offer: {entry}")]
    MissingTeaser { entry: Value },

    /// `thumbnail` missing, empty, or of the wrong shape
    #[error("No hires thumbnail url found in offer: {entry}")]
    MissingThumbnail { entry: Value },

    /// `payout` missing or not representable as a string
    #[error("No payout entry found in offer: {entry}")]
    MissingPayout { entry: Value },

    /// `thumbnail` present but not a well-formed absolute URL
    #[error("Invalid thumbnail url: {url}")]
    InvalidThumbnailUrl { url: String, entry: Value },

    /// The offers list contained something other than an object
    #[error("Offer entry is not an object: {entry}")]
    EntryNotAnObject { entry: Value },
}

impl RecordError {
    /// The raw entry that failed validation.
    pub fn entry(&self) -> &Value {
        match self {
            RecordError::MissingTitle { entry }
            | RecordError::MissingTeaser { entry }
            | RecordError::MissingThumbnail { entry }
            | RecordError::MissingPayout { entry }
            | RecordError::InvalidThumbnailUrl { entry, .. }
            | RecordError::EntryNotAnObject { entry } => entry,
        }
    }

    /// Stable diagnostic code.
    pub fn error_code(&self) -> i32 {
        match self {
            RecordError::MissingTitle { .. } => 0,
            RecordError::MissingTeaser { .. } => 1,
            RecordError::MissingThumbnail { .. } => 2,
            RecordError::MissingPayout { .. } => 3,
            RecordError::InvalidThumbnailUrl { .. } => 4,
            RecordError::EntryNotAnObject { .. } => 5,
        }
    }
}

/// One validated offer.
///
/// Only constructible through [`OfferRecord::from_raw`], so every instance
/// has non-empty text fields and a parsed thumbnail URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferRecord {
    title: String,
    teaser: String,
    thumbnail_url: Url,
    payout: String,
}

impl OfferRecord {
    /// Validate a raw offer entry.
    ///
    /// Fields are checked in the order title, teaser, thumbnail, payout;
    /// the thumbnail URL is parsed last.
    pub fn from_raw(raw: &Value) -> Result<Self, RecordError> {
        let Some(fields) = raw.as_object() else {
            return Err(RecordError::EntryNotAnObject { entry: raw.clone() });
        };

        let title = non_empty_str(fields, "title")
            .ok_or_else(|| RecordError::MissingTitle { entry: raw.clone() })?;
        let teaser = non_empty_str(fields, "teaser")
            .ok_or_else(|| RecordError::MissingTeaser { entry: raw.clone() })?;
        let thumbnail = thumbnail_str(fields)
            .ok_or_else(|| RecordError::MissingThumbnail { entry: raw.clone() })?;
        let payout =
            payout_string(fields).ok_or_else(|| RecordError::MissingPayout { entry: raw.clone() })?;

        let thumbnail_url =
            Url::parse(thumbnail).map_err(|_| RecordError::InvalidThumbnailUrl {
                url: thumbnail.to_string(),
                entry: raw.clone(),
            })?;

        Ok(Self {
            title: title.to_string(),
            teaser: teaser.to_string(),
            thumbnail_url,
            payout,
        })
    }

    /// Offer title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Short teaser text.
    pub fn teaser(&self) -> &str {
        &self.teaser
    }

    /// Hi-res thumbnail location.
    pub fn thumbnail_url(&self) -> &Url {
        &self.thumbnail_url
    }

    /// Payout, as sent by the feed.
    pub fn payout(&self) -> &str {
        &self.payout
    }
}

fn non_empty_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

// Either a plain URL string or the `{ "lowres": .., "hires": .. }` object.
fn thumbnail_str(fields: &Map<String, Value>) -> Option<&str> {
    match fields.get("thumbnail")? {
        Value::String(s) if !s.is_empty() => Some(s.as_str()),
        Value::Object(sizes) => non_empty_str(sizes, "hires"),
        _ => None,
    }
}

fn payout_string(fields: &Map<String, Value>) -> Option<String> {
    match fields.get("payout")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_entry() {
        let raw = json!({
            "title": "T",
            "teaser": "S",
            "thumbnail": "https://example.com/a.png",
            "payout": "33"
        });

        let record = OfferRecord::from_raw(&raw).unwrap();
        assert_eq!(record.title(), "T");
        assert_eq!(record.teaser(), "S");
        assert_eq!(record.thumbnail_url().as_str(), "https://example.com/a.png");
        assert_eq!(record.thumbnail_url().host_str(), Some("example.com"));
        assert_eq!(record.payout(), "33");
    }

    #[test]
    fn test_fields_are_required_in_order() {
        let mut raw = json!({});
        assert!(matches!(
            OfferRecord::from_raw(&raw),
            Err(RecordError::MissingTitle { .. })
        ));

        raw["title"] = json!("");
        assert!(matches!(
            OfferRecord::from_raw(&raw),
            Err(RecordError::MissingTitle { .. })
        ));

        raw["title"] = json!("this title is allowed");
        assert!(matches!(
            OfferRecord::from_raw(&raw),
            Err(RecordError::MissingTeaser { .. })
        ));

        raw["teaser"] = json!("");
        assert!(matches!(
            OfferRecord::from_raw(&raw),
            Err(RecordError::MissingTeaser { .. })
        ));

        raw["teaser"] = json!("this teaser is allowed");
        assert!(matches!(
            OfferRecord::from_raw(&raw),
            Err(RecordError::MissingThumbnail { .. })
        ));

        raw["thumbnail"] = json!("");
        assert!(matches!(
            OfferRecord::from_raw(&raw),
            Err(RecordError::MissingThumbnail { .. })
        ));

        raw["thumbnail"] = json!({ "hires": "this.is.bad.url" });
        assert!(matches!(
            OfferRecord::from_raw(&raw),
            Err(RecordError::MissingPayout { .. })
        ));

        raw["payout"] = json!(33);
        match OfferRecord::from_raw(&raw) {
            Err(RecordError::InvalidThumbnailUrl { url, entry }) => {
                assert_eq!(url, "this.is.bad.url");
                assert_eq!(entry, raw);
            }
            other => panic!("expected InvalidThumbnailUrl, got {:?}", other),
        }

        raw["thumbnail"] = json!({ "lowres": "http://www.google.com/s", "hires": "http://www.google.com" });
        let record = OfferRecord::from_raw(&raw).unwrap();
        assert_eq!(record.thumbnail_url().as_str(), "http://www.google.com/");
        assert_eq!(record.payout(), "33");
    }

    #[test]
    fn test_wrongly_typed_fields_are_rejected() {
        let base = json!({
            "title": "T",
            "teaser": "S",
            "thumbnail": "https://example.com/a.png",
            "payout": "33"
        });

        let cases = [
            ("title", json!(7), 0),
            ("teaser", json!(["S"]), 1),
            ("thumbnail", json!(true), 2),
            ("thumbnail", json!({ "lowres": "https://example.com/a.png" }), 2),
            ("payout", json!(""), 3),
            ("payout", json!(null), 3),
            ("payout", json!(false), 3),
        ];

        for (field, value, code) in cases {
            let mut raw = base.clone();
            raw[field] = value;
            let err = OfferRecord::from_raw(&raw).unwrap_err();
            assert_eq!(err.error_code(), code, "field {} with {}", field, raw[field]);
            assert_eq!(err.entry(), &raw);
        }
    }

    #[test]
    fn test_numeric_payout_is_normalized() {
        let raw = json!({
            "title": "T",
            "teaser": "S",
            "thumbnail": "https://example.com/a.png",
            "payout": 1.5
        });
        assert_eq!(OfferRecord::from_raw(&raw).unwrap().payout(), "1.5");
    }

    #[test]
    fn test_non_object_entry() {
        let err = OfferRecord::from_raw(&json!("offer")).unwrap_err();
        assert!(matches!(err, RecordError::EntryNotAnObject { .. }));
        assert_eq!(err.error_code(), 5);
    }

    #[test]
    fn test_record_error_messages_include_entry() {
        let raw = json!({ "teaser": "S" });
        let err = OfferRecord::from_raw(&raw).unwrap_err();
        assert!(err.to_string().contains("\"teaser\":\"S\""));
    }
}
