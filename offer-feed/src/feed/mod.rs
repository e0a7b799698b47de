//! Signed fetch pipeline for the offer feed.
//!
//! This module provides:
//! - [`RequestSigner`] / [`Sha1HashkeySigner`]: canonical SHA-1 request signing
//! - [`build_request`]: signed GET request construction
//! - [`verify`]: response signature verification
//! - [`OffersClient`]: the fetch executor
//! - [`FetchHandle`], [`PendingFetch`], [`LatestFetch`]: cancellation
//!
//! # Pipeline
//!
//! ```text
//! FetchOptions ─► RequestContext ─► sign ─► GET ─► verify ─► decode ─► Vec<OfferRecord>
//! ```
//!
//! Every fetch ends in exactly one [`FetchOutcome`] unless it is cancelled,
//! in which case nothing is delivered.

mod client;
mod error;
mod handle;
mod options;
mod request;
mod signer;
mod verifier;

pub use client::OffersClient;
pub use error::{FetchError, FetchOutcome};
pub use handle::{FetchHandle, LatestFetch, PendingFetch};
pub use options::FetchOptions;
pub use request::{build_request, RequestContext, TransportRequest};
pub use signer::{
    build_query_string, sign, sign_body, ParameterSet, RequestSigner, Sha1HashkeySigner,
    Signature, HASHKEY_PARAM,
};
pub use verifier::verify;
