//! Signed-response verification.
//!
//! Runs before the body is parsed, so a tampered payload is rejected
//! without ever being interpreted.

use reqwest::header::HeaderMap;
use tracing::warn;

use super::error::FetchError;
use super::signer::RequestSigner;

/// Check that `header` carries the signature of `body_text`.
///
/// The comparison is exact and case-sensitive against the lowercase hex
/// digest. A header value that is not visible ASCII cannot match and is
/// reported as a mismatch.
pub fn verify(
    body_text: &str,
    headers: &HeaderMap,
    header: &str,
    signer: &dyn RequestSigner,
) -> Result<(), FetchError> {
    let Some(value) = headers.get(header) else {
        warn!(header, "Response signature header missing");
        return Err(FetchError::SignatureHeaderMissing {
            header: header.to_string(),
        });
    };

    let actual = match value.to_str() {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    };
    let expected = signer.body_signature(body_text);

    if expected != actual.as_str() {
        warn!(%expected, %actual, "Response signature mismatch");
        return Err(FetchError::SignatureMismatch { expected, actual });
    }

    Ok(())
}
