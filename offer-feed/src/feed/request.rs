//! Signed request assembly.

use url::Url;

use super::options::FetchOptions;
use super::signer::{ParameterSet, RequestSigner, Signature};
use crate::config::RequestDefaults;

/// Every input that goes into one offers request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Application id
    pub appid: String,
    /// Per-install device identifier
    pub device_id: String,
    /// Client IP
    pub ip: String,
    /// Locale code
    pub locale: String,
    /// Result page
    pub page: u32,
    /// Publisher-side timestamp tag
    pub ps_time: String,
    /// Campaign / publisher tag
    pub pub0: String,
    /// Request time in seconds since the Unix epoch
    pub timestamp: i64,
    /// User id
    pub uid: String,
    /// Offer-type filter code
    pub offer_types: String,
}

impl RequestContext {
    /// Combine the fixed settings with per-call options.
    pub fn new(
        defaults: &RequestDefaults,
        device_id: &str,
        options: &FetchOptions,
        timestamp: i64,
    ) -> Self {
        Self {
            appid: defaults.appid.clone(),
            device_id: device_id.to_string(),
            ip: defaults.ip.clone(),
            locale: options.locale.clone(),
            page: options.page,
            ps_time: defaults.ps_time.clone(),
            pub0: defaults.pub0.clone(),
            timestamp,
            uid: defaults.uid.clone(),
            offer_types: defaults.offer_types.clone(),
        }
    }

    /// The unsigned parameter set, in query-string order.
    pub fn parameters(&self) -> ParameterSet {
        let mut params = ParameterSet::new();
        params.insert("appid", self.appid.as_str());
        params.insert("device_id", self.device_id.as_str());
        params.insert("ip", self.ip.as_str());
        params.insert("locale", self.locale.as_str());
        params.insert("page", self.page.to_string());
        params.insert("ps_time", self.ps_time.as_str());
        params.insert("pub0", self.pub0.as_str());
        params.insert("timestamp", self.timestamp.to_string());
        params.insert("uid", self.uid.as_str());
        params.insert("offer_types", self.offer_types.as_str());
        params
    }
}

/// A fully signed GET request, ready to send.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    url: Url,
    params: ParameterSet,
    signature: Signature,
}

impl TransportRequest {
    /// Target URL including the query string.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The signed parameters, `hashkey` last.
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// The request signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// Sign the context's parameters and render them onto `endpoint`.
///
/// Values are not validated here; a malformed setting is a configuration
/// bug, caught by [`crate::config::FeedConfig::validate`].
pub fn build_request(
    endpoint: &Url,
    context: &RequestContext,
    signer: &dyn RequestSigner,
) -> TransportRequest {
    let mut params = context.parameters();
    let signature = signer.sign_params(&mut params);

    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in params.iter() {
            query.append_pair(key, value);
        }
    }

    TransportRequest {
        url,
        params,
        signature,
    }
}
