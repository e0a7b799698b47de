//! Offer records and payload decoding.
//!
//! - [`OfferRecord`]: one validated offer
//! - [`decode_offers`]: body text to an ordered list of records
//! - [`BatchPolicy`]: all-or-nothing vs. drop-invalid handling

mod decoder;
mod record;

pub use decoder::{
    decode_offers, locate_offers, parse_payload, validate_offers, BatchPolicy, DecodeError,
};
pub use record::{OfferRecord, RecordError};
