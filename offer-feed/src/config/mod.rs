//! Configuration types for the offer feed.
//!
//! These types are serde-deserializable so an embedding application can load
//! them from whatever source it uses. Every field has a default matching the
//! published protocol sample, so `FeedConfig::default()` is a working setup
//! once the API key environment variable is set.
//!
//! ```rust,ignore
//! let config: FeedConfig = toml::from_str(&app_settings)?;
//! config.validate()?;
//! let signer = Sha1HashkeySigner::from_auth(&config.auth)?;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigurationError;

/// Top-level configuration for an [`crate::feed::OffersClient`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    /// REST endpoint configuration
    #[serde(default)]
    pub rest: RestConfig,
    /// Fixed request parameters
    #[serde(default)]
    pub request: RequestDefaults,
    /// Where the offers live inside the response payload
    #[serde(default)]
    pub layout: PayloadLayout,
    /// Credential and signature settings
    #[serde(default)]
    pub auth: AuthConfig,
}

impl FeedConfig {
    /// Check the settings that would otherwise surface as confusing
    /// transport or signature failures.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.rest.endpoint()?;
        if self.request.appid.is_empty() {
            return Err(ConfigurationError::MissingField("request.appid".to_string()));
        }
        if self.layout.offers_field.is_empty() {
            return Err(ConfigurationError::MissingField(
                "layout.offers_field".to_string(),
            ));
        }
        if self.auth.signature_header.is_empty() {
            return Err(ConfigurationError::MissingField(
                "auth.signature_header".to_string(),
            ));
        }
        Ok(())
    }
}

/// REST endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Full URL of the offers endpoint, without query string
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://api.fyber.com/feed/v1/offers.json".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RestConfig {
    /// Returns the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse the endpoint URL.
    pub fn endpoint(&self) -> Result<Url, ConfigurationError> {
        Url::parse(&self.base_url)
            .map_err(|e| ConfigurationError::invalid_value("rest.base_url", e.to_string()))
    }
}

/// Request parameters that are fixed per application.
///
/// The per-call parameters (page, locale) come from
/// [`crate::feed::FetchOptions`]; device id and timestamp are supplied by
/// the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDefaults {
    /// Application id issued by the feed operator
    #[serde(default = "default_appid")]
    pub appid: String,
    /// User id within the application
    #[serde(default = "default_uid")]
    pub uid: String,
    /// Client IP reported to the feed
    #[serde(default = "default_ip")]
    pub ip: String,
    /// Campaign / publisher tag
    #[serde(default = "default_pub0")]
    pub pub0: String,
    /// Publisher-side timestamp tag
    #[serde(default = "default_ps_time")]
    pub ps_time: String,
    /// Offer-type filter code
    #[serde(default = "default_offer_types")]
    pub offer_types: String,
}

fn default_appid() -> String {
    "2070".to_string()
}

fn default_uid() -> String {
    "spiderman".to_string()
}

fn default_ip() -> String {
    "109.235.143.113".to_string()
}

fn default_pub0() -> String {
    "campaign2".to_string()
}

fn default_ps_time() -> String {
    "1312211903".to_string()
}

fn default_offer_types() -> String {
    "112".to_string()
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            appid: default_appid(),
            uid: default_uid(),
            ip: default_ip(),
            pub0: default_pub0(),
            ps_time: default_ps_time(),
            offer_types: default_offer_types(),
        }
    }
}

/// Location of the offers list inside the decoded payload.
///
/// The default matches the signed feed, which puts `offers` at the top
/// level. Endpoints that wrap everything in a root object with a status
/// code use [`PayloadLayout::wrapped`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadLayout {
    /// Object that contains the offers list; `None` means the top level
    #[serde(default)]
    pub root_field: Option<String>,
    /// Integer status field that must exist inside the root object
    #[serde(default)]
    pub status_field: Option<String>,
    /// Name of the offers array
    #[serde(default = "default_offers_field")]
    pub offers_field: String,
}

fn default_offers_field() -> String {
    "offers".to_string()
}

impl Default for PayloadLayout {
    fn default() -> Self {
        Self {
            root_field: None,
            status_field: None,
            offers_field: default_offers_field(),
        }
    }
}

impl PayloadLayout {
    /// Layout with a `response` root object carrying a `code` status field.
    pub fn wrapped() -> Self {
        Self {
            root_field: Some("response".to_string()),
            status_field: Some("code".to_string()),
            offers_field: default_offers_field(),
        }
    }
}

/// Authentication configuration.
///
/// The API key is loaded from an environment variable, never from config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Response header carrying the body signature
    #[serde(default = "default_signature_header")]
    pub signature_header: String,
}

fn default_api_key_env() -> String {
    "OFFERS_API_KEY".to_string()
}

fn default_signature_header() -> String {
    "X-Sponsorpay-Response-Signature".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            signature_header: default_signature_header(),
        }
    }
}

impl AuthConfig {
    /// Load the API key from the environment.
    pub fn load_api_key(&self) -> Result<String, ConfigurationError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigurationError::EnvVarMissing(self.api_key_env.clone()))
    }
}
