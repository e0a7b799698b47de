//! Per-call fetch options.

use crate::offers::BatchPolicy;

/// Options supplied by the caller for one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Result page, starting at 1
    pub page: u32,
    /// Locale code sent to the feed
    pub locale: String,
    /// Require the response signature header to match the body
    pub verify_signature: bool,
    /// Handling of invalid entries
    pub batch_policy: BatchPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page: 1,
            locale: "DE".to_string(),
            verify_signature: true,
            batch_policy: BatchPolicy::FailFast,
        }
    }
}

impl FetchOptions {
    /// Set the page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set the locale code.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Enable or disable response signature verification.
    pub fn with_verification(mut self, verify_signature: bool) -> Self {
        self.verify_signature = verify_signature;
        self
    }

    /// Set the batch policy.
    pub fn with_batch_policy(mut self, batch_policy: BatchPolicy) -> Self {
        self.batch_policy = batch_policy;
        self
    }
}
