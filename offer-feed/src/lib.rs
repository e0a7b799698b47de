//! Client for a signed offer feed.
//!
//! Builds SHA-1 signed GET requests, fetches the feed over HTTP, verifies the
//! response signature header and decodes the payload into validated
//! [`OfferRecord`]s.
//!
//! ```rust,ignore
//! use offer_feed::{FeedConfig, FetchOptions, OffersClient, Sha1HashkeySigner};
//!
//! let config = FeedConfig::default();
//! let signer = Sha1HashkeySigner::from_auth(&config.auth)?;
//! let client = OffersClient::new(config, device_id, Box::new(signer))?;
//!
//! match client.fetch(FetchOptions::default()).outcome().await {
//!     Some(Ok(offers)) => show(offers),
//!     Some(Err(err)) => show_error(err.error_code()),
//!     None => {} // cancelled
//! }
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod offers;

pub use config::{AuthConfig, FeedConfig, PayloadLayout, RequestDefaults, RestConfig};
pub use error::{ConfigurationError, ErrorCategory, ErrorClassification};
pub use feed::{
    FetchError, FetchHandle, FetchOptions, FetchOutcome, LatestFetch, OffersClient, PendingFetch,
    RequestSigner, Sha1HashkeySigner, Signature,
};
pub use offers::{BatchPolicy, DecodeError, OfferRecord, RecordError};
