//! Canonical request normalization and the signing payload.
//!
//! The payload signed by both sides is:
//!
//! ```text
//! METHOD\n
//! PATH\n
//! name1:value1\n
//! name2:value2\n
//! \n
//! BODY
//! ```
//!
//! Header names are lower-cased and values are taken verbatim. Each header
//! occupies one line and an empty line closes the header block, so no header
//! set can render the same bytes as another: names never contain `:` and
//! neither names, values nor the path contain a line break. When normalizing a
//! [`CanonicalRequest`] the headers are sorted by name, so the payload does not
//! depend on the iteration order of the header mapping. The signature is the
//! lower-case hex HMAC-SHA256 of the payload keyed with the secret.

use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::request::{CanonicalRequest, Method, Secret};

type HmacSha256 = Hmac<Sha256>;

/// A request in its deterministic, order-stable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCanonicalRequest {
    /// The request method.
    pub method: Method,
    /// The path, verbatim.
    pub path: String,
    /// Lower-cased header names with verbatim values, in signing order.
    pub headers: Vec<(String, String)>,
    /// The body, verbatim.
    pub body: Option<String>,
}

impl NormalizedCanonicalRequest {
    /// Build a normalized request whose headers keep the given order.
    ///
    /// Used by the verifier, where the order is dictated by the received
    /// signed-headers list.
    pub(crate) fn with_ordered_headers(
        request: &CanonicalRequest,
        headers: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            method: request.method(),
            path: request.path().to_owned(),
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
            body: request.body().map(ToOwned::to_owned),
        }
    }

    /// Render the exact byte string that is signed.
    ///
    /// # Examples
    ///
    /// ```
    /// use appsign_auth::{CanonicalRequest, Method, normalize};
    ///
    /// let request = CanonicalRequest::new(Method::Get, "/spaces")
    ///     .unwrap()
    ///     .with_header("b", "2")
    ///     .unwrap()
    ///     .with_header("a", "1")
    ///     .unwrap();
    /// assert_eq!(normalize(&request).payload(), "GET\n/spaces\na:1\nb:2\n\n");
    /// ```
    #[must_use]
    pub fn payload(&self) -> String {
        let headers: String = self
            .headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();
        format!(
            "{}\n{}\n{headers}\n{}",
            self.method,
            self.path,
            self.body.as_deref().unwrap_or_default()
        )
    }
}

/// Normalize a request: copy method, path and body, and sort headers by
/// lower-cased name.
#[must_use]
pub fn normalize(request: &CanonicalRequest) -> NormalizedCanonicalRequest {
    let mut normalized = NormalizedCanonicalRequest::with_ordered_headers(
        request,
        request
            .headers()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );
    normalized.headers.sort_unstable();
    normalized
}

/// Compute the hex-encoded HMAC-SHA256 signature of a normalized request.
#[must_use]
pub fn compute_signature(normalized: &NormalizedCanonicalRequest, secret: &Secret) -> String {
    hex::encode(hmac_sha256(secret.as_bytes(), normalized.payload().as_bytes()))
}

/// Compare two signatures in constant time.
#[must_use]
pub fn signatures_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Compute HMAC-SHA256 and return the raw bytes.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
