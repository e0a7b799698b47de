//! Fetch executor for the offer feed.
//!
//! This module runs the whole pipeline for one fetch:
//! - Signing and building the GET request via the `RequestSigner` trait
//! - Sending it with a shared `reqwest` client
//! - Verifying the response signature header
//! - Decoding and validating the offers
//!
//! The pipeline never retries. Callers that want another attempt invoke
//! fetch again, guided by [`crate::error::ErrorClassification`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use reqwest::{header, Client};
use tokio::sync::oneshot;
use tracing::{debug, info};
use url::Url;

use super::error::{FetchError, FetchOutcome};
use super::handle::{Deliver, DeliverySlot, FetchHandle, PendingFetch};
use super::options::FetchOptions;
use super::request::{build_request, RequestContext, TransportRequest};
use super::signer::RequestSigner;
use super::verifier::verify;
use crate::config::FeedConfig;
use crate::error::ConfigurationError;
use crate::offers::decode_offers;

/// Client for the signed offer feed.
///
/// Cheap to clone; clones share the connection pool, signer and fetch id
/// counter.
///
/// # Example
///
/// ```ignore
/// let config = FeedConfig::default();
/// let signer = Sha1HashkeySigner::from_auth(&config.auth)?;
/// let client = OffersClient::new(config, device_id, Box::new(signer))?;
///
/// // Await on the current task
/// let offers = client.fetch_once(&FetchOptions::default().with_page(2)).await?;
///
/// // Or run in the background and keep a handle for cancellation
/// let handle = client.spawn_fetch(FetchOptions::default(), |outcome| {
///     render(outcome);
/// });
/// ```
#[derive(Clone)]
pub struct OffersClient {
    /// The underlying HTTP client
    client: Client,
    /// Parsed feed endpoint
    endpoint: Url,
    /// Configuration
    config: Arc<FeedConfig>,
    /// Device identifier sent with every request
    device_id: Arc<str>,
    /// Request signer for authentication
    signer: Arc<dyn RequestSigner>,
    /// Source of fetch ids for log correlation
    next_fetch_id: Arc<AtomicU64>,
}

impl OffersClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `config` - Feed configuration, validated here
    /// * `device_id` - Identifier of the device the offers are requested for
    /// * `signer` - Request signer holding the API key
    pub fn new(
        config: FeedConfig,
        device_id: impl Into<String>,
        signer: Box<dyn RequestSigner>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let endpoint = config.rest.endpoint()?;

        let device_id: String = device_id.into();
        if device_id.is_empty() {
            return Err(ConfigurationError::MissingField("device_id".to_string()));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.rest.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            config: Arc::new(config),
            device_id: Arc::from(device_id),
            signer: Arc::from(signer),
            next_fetch_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// The parsed feed endpoint, without query.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build the signed request for `options` at `timestamp` (Unix seconds).
    pub fn build_request(&self, options: &FetchOptions, timestamp: i64) -> TransportRequest {
        let context = RequestContext::new(&self.config.request, &self.device_id, options, timestamp);
        build_request(&self.endpoint, &context, self.signer.as_ref())
    }

    /// Run one fetch to completion on the calling task.
    pub async fn fetch_once(&self, options: &FetchOptions) -> FetchOutcome {
        let fetch_id = self.allocate_id();
        self.execute(fetch_id, options).await
    }

    /// Run one fetch on a spawned task and hand the outcome to `deliver`.
    ///
    /// `deliver` is called exactly once, on the worker task, unless the
    /// returned handle is cancelled or dropped first. Must be called from
    /// within a tokio runtime.
    pub fn spawn_fetch<F>(&self, options: FetchOptions, deliver: F) -> FetchHandle
    where
        F: FnOnce(FetchOutcome) + Send + 'static,
    {
        let fetch_id = self.allocate_id();
        let deliver: Deliver = Box::new(deliver);
        let slot: DeliverySlot = Arc::new(Mutex::new(Some(deliver)));

        let client = self.clone();
        let task_slot = slot.clone();
        let task = tokio::spawn(async move {
            let outcome = client.execute(fetch_id, &options).await;
            let deliver = task_slot.lock().take();
            match deliver {
                Some(deliver) => deliver(outcome),
                None => debug!(fetch_id, "Discarding outcome of cancelled fetch"),
            }
        });

        FetchHandle::new(fetch_id, task, slot)
    }

    /// Run one fetch on a spawned task and await its outcome elsewhere.
    pub fn fetch(&self, options: FetchOptions) -> PendingFetch {
        let (tx, rx) = oneshot::channel();
        let handle = self.spawn_fetch(options, move |outcome| {
            // The receiver is gone only if the caller lost interest
            let _ = tx.send(outcome);
        });
        PendingFetch::new(handle, rx)
    }

    fn allocate_id(&self) -> u64 {
        self.next_fetch_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn execute(&self, fetch_id: u64, options: &FetchOptions) -> FetchOutcome {
        let request = self.build_request(options, Utc::now().timestamp());
        debug!(
            fetch_id,
            endpoint = %self.endpoint,
            page = options.page,
            locale = %options.locale,
            "GET offers"
        );

        let response = self.client.get(request.url().clone()).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        debug!(fetch_id, status = status.as_u16(), bytes = body.len(), "Response received");

        let text = body_text(&body)?;

        if options.verify_signature {
            verify(
                text,
                &headers,
                &self.config.auth.signature_header,
                self.signer.as_ref(),
            )?;
            debug!(fetch_id, "Response signature verified");
        }

        let offers = decode_offers(text, &self.config.layout, options.batch_policy)?;
        info!(fetch_id, count = offers.len(), page = options.page, "Fetched offers");
        Ok(offers)
    }
}

impl fmt::Debug for OffersClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffersClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

/// Interpret the raw body as UTF-8 text.
fn body_text(body: &[u8]) -> Result<&str, FetchError> {
    if body.is_empty() {
        return Err(FetchError::EmptyResponseBody);
    }
    std::str::from_utf8(body).map_err(|_| FetchError::BodyNotText {
        bytes: body.to_vec(),
    })
}
