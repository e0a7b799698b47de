//! Canonical request signing and response body signatures.
//!
//! The feed authenticates requests with a SHA-1 "hashkey":
//! 1. Take every request parameter except `hashkey`
//! 2. Sort the pairs by parameter name
//! 3. Join them as `key=value` with `&`
//! 4. Append `&` and the lowercased API key
//! 5. SHA-1 the result and render it as 40 lowercase hex characters
//!
//! Signed responses use a different rule: SHA-1 of the raw body text
//! immediately followed by the API key, with no separator and no case change.

use std::fmt;

use sha1::{Digest, Sha1};

use crate::config::AuthConfig;
use crate::error::ConfigurationError;

/// Query parameter that carries the request signature.
pub const HASHKEY_PARAM: &str = "hashkey";

/// Ordered set of request parameters with unique keys.
///
/// Iteration follows insertion order, which is also the order used when
/// rendering the query string. Signing sorts independently, so insertion
/// order never affects the signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    pairs: Vec<(String, String)>,
}

impl ParameterSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter, returning the previous value if the key existed.
    ///
    /// Replacing a value keeps the key at its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.pairs.push((key, value));
                None
            }
        }
    }

    /// Look up a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = ParameterSet::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// A SHA-1 signature rendered as 40 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    /// Number of hex characters in a signature.
    pub const LEN: usize = 40;

    /// Hash `input` and wrap the lowercase hex digest.
    pub fn digest(input: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(input.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the signature, returning the hex digest.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Signature {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Signature {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Join `key=value` pairs with `&`, in the order given.
pub fn build_query_string(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the request hashkey for `params`.
///
/// Any `hashkey` entry already present is ignored, so re-signing a signed
/// set yields the same value.
pub fn sign(params: &ParameterSet, secret_key: &str) -> Signature {
    let mut pairs: Vec<(&str, &str)> = params.iter().filter(|(k, _)| *k != HASHKEY_PARAM).collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let canonical = format!(
        "{}&{}",
        build_query_string(&pairs),
        secret_key.to_lowercase()
    );
    Signature::digest(&canonical)
}

/// Compute the expected signature of a response body.
pub fn sign_body(body: &str, secret_key: &str) -> Signature {
    let mut input = String::with_capacity(body.len() + secret_key.len());
    input.push_str(body);
    input.push_str(secret_key);
    Signature::digest(&input)
}

/// Trait for the feed's authentication scheme.
///
/// The client only talks to this trait, so tests and alternative feeds can
/// substitute their own signer.
pub trait RequestSigner: Send + Sync {
    /// Sign the request parameters and insert the signature under
    /// [`HASHKEY_PARAM`]. Must be called after every other parameter is set.
    fn sign_params(&self, params: &mut ParameterSet) -> Signature;

    /// Expected signature for a raw response body.
    fn body_signature(&self, body: &str) -> Signature;
}

/// SHA-1 hashkey signer keyed by the feed API key.
#[derive(Clone)]
pub struct Sha1HashkeySigner {
    api_key: String,
}

impl Sha1HashkeySigner {
    /// Create a signer for the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Create a signer from the key named in [`AuthConfig::api_key_env`].
    pub fn from_auth(auth: &AuthConfig) -> Result<Self, ConfigurationError> {
        auth.load_api_key().map(Self::new)
    }
}

impl fmt::Debug for Sha1HashkeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sha1HashkeySigner")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl RequestSigner for Sha1HashkeySigner {
    fn sign_params(&self, params: &mut ParameterSet) -> Signature {
        let signature = sign(params, &self.api_key);
        params.insert(HASHKEY_PARAM, signature.as_str());
        signature
    }

    fn body_signature(&self, body: &str) -> Signature {
        sign_body(body, &self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documented_params() -> ParameterSet {
        [
            ("appid", "157"),
            ("device_id", "2b6f0cc904d137be2e1730235f5664094b831186"),
            ("ip", "212.45.111.17"),
            ("locale", "de"),
            ("page", "2"),
            ("ps_time", "1312211903"),
            ("pub0", "campaign2"),
            ("timestamp", "1312553361"),
            ("uid", "player1"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_documented_hashkey_vector() {
        let signature = sign(&documented_params(), "e95a21621a1865bcbae3bee89c4d4f84");
        assert_eq!(signature, "7a2b1604c03d46eec1ecd4a686787b75dd693c4d");
        assert_eq!(signature.as_str().len(), Signature::LEN);
    }

    #[test]
    fn test_secret_key_is_lowercased() {
        let signature = sign(&documented_params(), "E95A21621A1865BCBAE3BEE89C4D4F84");
        assert_eq!(signature, "7a2b1604c03d46eec1ecd4a686787b75dd693c4d");
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let forward = documented_params();
        let reversed: ParameterSet = {
            let mut pairs: Vec<(String, String)> = forward
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            pairs.reverse();
            pairs.into_iter().collect()
        };

        assert_ne!(
            forward.iter().next().map(|(k, _)| k),
            reversed.iter().next().map(|(k, _)| k)
        );
        assert_eq!(sign(&forward, "key"), sign(&reversed, "key"));
    }

    #[test]
    fn test_existing_hashkey_is_ignored() {
        let mut params = documented_params();
        let before = sign(&params, "e95a21621a1865bcbae3bee89c4d4f84");
        params.insert(HASHKEY_PARAM, "stale");
        assert_eq!(sign(&params, "e95a21621a1865bcbae3bee89c4d4f84"), before);
    }

    #[test]
    fn test_canonical_string_shape() {
        let params: ParameterSet = [("b", "2"), ("a", "1")].into_iter().collect();
        // sha1("a=1&b=2&key")
        assert_eq!(sign(&params, "KEY"), "719c6646c1c4d51cb6954d977523d700ebb60972");
    }

    #[test]
    fn test_sign_body_has_no_separator() {
        // sha1("{\"offers\":[]}secret")
        assert_eq!(
            sign_body(r#"{"offers":[]}"#, "secret"),
            "054801eefdca0cd8050314b5751633db7c504600"
        );
        assert_ne!(sign_body("body", "Key"), sign_body("body", "key"));
    }

    #[test]
    fn test_signer_inserts_hashkey_last() {
        let signer = Sha1HashkeySigner::new("e95a21621a1865bcbae3bee89c4d4f84");
        let mut params = documented_params();
        let signature = signer.sign_params(&mut params);

        let (last_key, last_value) = params.iter().last().unwrap();
        assert_eq!(last_key, HASHKEY_PARAM);
        assert_eq!(last_value, signature.as_str());
        assert_eq!(signature, "7a2b1604c03d46eec1ecd4a686787b75dd693c4d");
    }

    #[test]
    fn test_parameter_set_replace_keeps_position() {
        let mut params: ParameterSet = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(params.insert("a", "3"), Some("1".to_string()));
        assert_eq!(params.len(), 2);
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_signer_debug_redacts_key() {
        let signer = Sha1HashkeySigner::new("super-secret");
        assert!(!format!("{:?}", signer).contains("super-secret"));
    }
}
