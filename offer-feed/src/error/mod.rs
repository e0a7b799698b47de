//! Shared error layer for the offer feed.
//!
//! This module provides:
//! - [`ConfigurationError`] for construction-time failures (config, credentials)
//! - [`ErrorClassification`] so callers can decide whether re-invoking a fetch
//!   is worthwhile
//!
//! Pipeline failures live next to the pipeline in [`crate::feed::FetchError`]
//! and [`crate::offers::RecordError`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use offer_feed::error::ErrorClassification;
//!
//! fn on_error(err: &impl ErrorClassification) {
//!     if err.is_transient() {
//!         // offer a "pull to retry" affordance
//!     }
//! }
//! ```

mod common;
mod traits;

pub use common::*;
pub use traits::*;
