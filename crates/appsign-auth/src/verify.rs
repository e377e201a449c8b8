//! Request verification.
//!
//! [`verify`] runs these checks in order, each a possible rejection:
//!
//! 1. Extract [`RequestMetadata`] and check its shape.
//! 2. Check freshness: the signature may be neither from the future nor
//!    older than the time-to-live.
//! 3. Rebuild the normalized request from exactly the headers named in the
//!    received signed-headers list, in that order.
//! 4. Recompute the HMAC and compare in constant time.
//! 5. Decode the identity context and require every context header present
//!    to be covered by the signature.

use appsign_core::{Context, SigningConfig, TimeToLive, Timestamp};
use tracing::debug;

use crate::canonical::{NormalizedCanonicalRequest, compute_signature, signatures_match};
use crate::error::AuthError;
use crate::headers::{ContentfulHeader, RequestMetadata, SignedRequestHeaders, decode_context};
use crate::request::{CanonicalRequest, Secret};
use crate::secrets::SecretProvider;

/// Verify a signed request and return its identity context.
///
/// Protocol headers are read from `headers`; every other signed header is
/// read from `request`. Protocol headers inside the request's own header map
/// are ignored.
///
/// # Errors
///
/// Returns [`AuthError::MalformedMetadata`], [`AuthError::NotYetValid`],
/// [`AuthError::Expired`], [`AuthError::SignatureMismatch`] or
/// [`AuthError::InvalidContext`], in the order the checks run.
///
/// # Examples
///
/// ```
/// use appsign_auth::{CanonicalRequest, Method, Secret, sign, verify};
/// use appsign_core::{Context, TimeToLive, Timestamp};
///
/// let request = CanonicalRequest::new(Method::Get, "/entries").unwrap();
/// let secret = Secret::new("a".repeat(64)).unwrap();
/// let context = Context::user("sp1", "env1", "u1").unwrap();
/// let signed_at = Timestamp::from_millis(1_700_000_000_000).unwrap();
/// let headers = sign(&request, &secret, &context, signed_at).unwrap();
///
/// let now = Timestamp::from_millis(1_700_000_005_000).unwrap();
/// let verified = verify(&request, &headers, &secret, TimeToLive::from_millis(60_000), now).unwrap();
/// assert_eq!(verified, context);
/// ```
pub fn verify(
    request: &CanonicalRequest,
    headers: &SignedRequestHeaders,
    secret: &Secret,
    ttl: TimeToLive,
    now: Timestamp,
) -> Result<Context, AuthError> {
    let metadata = verify_signature(request, headers, secret, ttl, now)?;

    let context = decode_context(headers)?;
    for header in ContentfulHeader::CONTEXT {
        if headers.contains(header) && !metadata.is_signed(header.as_str()) {
            debug!(%header, "Context header is not covered by the signature");
            return Err(AuthError::InvalidContext(format!(
                "{header} is not a signed header"
            )));
        }
    }

    Ok(context)
}

/// Verify metadata, freshness and signature without decoding any context.
///
/// Use this for requests signed with [`crate::sign_without_context`]. Any
/// context headers present are ignored unless they are signed.
///
/// # Errors
///
/// See [`verify`], except that [`AuthError::InvalidContext`] is never returned.
pub fn verify_signature(
    request: &CanonicalRequest,
    headers: &SignedRequestHeaders,
    secret: &Secret,
    ttl: TimeToLive,
    now: Timestamp,
) -> Result<RequestMetadata, AuthError> {
    let metadata = RequestMetadata::from_headers(headers)?;

    debug!(
        method = %request.method(),
        path = request.path(),
        timestamp = %metadata.timestamp,
        signed_headers = ?metadata.signed_headers,
        "Verifying request signature"
    );

    check_freshness(metadata.timestamp, ttl, now)?;

    let normalized = reconstruct(request, headers, &metadata)?;
    let expected = compute_signature(&normalized, secret);

    if signatures_match(&metadata.signature, &expected) {
        debug!("Signature verification succeeded");
        Ok(metadata)
    } else {
        debug!(signed_headers = ?metadata.signed_headers, "Signature mismatch");
        Err(AuthError::SignatureMismatch)
    }
}

/// Reject signatures from the future or older than `ttl`.
///
/// # Errors
///
/// Returns [`AuthError::NotYetValid`] if `timestamp > now`, or
/// [`AuthError::Expired`] if `now - timestamp > ttl`.
pub fn check_freshness(timestamp: Timestamp, ttl: TimeToLive, now: Timestamp) -> Result<(), AuthError> {
    let Some(age_ms) = now.millis_since(timestamp) else {
        debug!(%timestamp, %now, "Signature timestamp is in the future");
        return Err(AuthError::NotYetValid {
            timestamp: timestamp.as_millis(),
            now: now.as_millis(),
        });
    };
    if age_ms > ttl.as_millis() {
        debug!(age_ms, ttl_ms = ttl.as_millis(), "Signature has expired");
        return Err(AuthError::Expired {
            age_ms,
            ttl_ms: ttl.as_millis(),
        });
    }
    Ok(())
}

/// Collect the values of the signed headers, in signed-list order.
///
/// A listed context header that is absent means the request does not carry
/// a complete context, which is reported as [`AuthError::InvalidContext`].
fn reconstruct(
    request: &CanonicalRequest,
    headers: &SignedRequestHeaders,
    metadata: &RequestMetadata,
) -> Result<NormalizedCanonicalRequest, AuthError> {
    let mut pairs = Vec::with_capacity(metadata.signed_headers.len());
    for name in &metadata.signed_headers {
        let value = match ContentfulHeader::from_name(name) {
            Some(header) => {
                let value = headers.get(header).ok_or_else(|| {
                    if header.is_context() {
                        AuthError::InvalidContext(format!("signed header {name} is missing"))
                    } else {
                        AuthError::MalformedMetadata(format!("signed header {name} is missing"))
                    }
                })?;
                // Request headers are checked on construction; wire values are not.
                if value.chars().any(char::is_control) {
                    return Err(AuthError::MalformedMetadata(format!(
                        "value of {name} contains control characters"
                    )));
                }
                value
            }
            None => request.header(name).ok_or_else(|| {
                AuthError::MalformedMetadata(format!("signed header {name} is missing"))
            })?,
        };
        pairs.push((name.clone(), value.to_owned()));
    }
    Ok(NormalizedCanonicalRequest::with_ordered_headers(
        request, pairs,
    ))
}

/// Verifier bound to a freshness window and the wall clock.
///
/// # Examples
///
/// ```
/// use appsign_auth::RequestVerifier;
/// use appsign_core::SigningConfig;
///
/// let verifier = RequestVerifier::from_config(&SigningConfig::default());
/// assert_eq!(verifier.ttl().as_millis(), 30_000);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestVerifier {
    ttl: TimeToLive,
}

impl RequestVerifier {
    /// Create a verifier with the given freshness window.
    #[must_use]
    pub fn new(ttl: TimeToLive) -> Self {
        Self { ttl }
    }

    /// Create a verifier from configuration.
    #[must_use]
    pub fn from_config(config: &SigningConfig) -> Self {
        Self::new(config.ttl())
    }

    /// The freshness window.
    #[must_use]
    pub fn ttl(&self) -> TimeToLive {
        self.ttl
    }

    /// Verify against the current wall-clock time.
    ///
    /// # Errors
    ///
    /// See [`verify`].
    pub fn verify(
        &self,
        request: &CanonicalRequest,
        headers: &SignedRequestHeaders,
        secret: &Secret,
    ) -> Result<Context, AuthError> {
        verify(request, headers, secret, self.ttl, Timestamp::now()?)
    }

    /// Look up the secret for the claimed subject, then verify.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidContext`] if the headers carry no valid
    /// context, [`AuthError::UnknownSubject`] if the provider has no secret
    /// for it, or any error of [`verify`].
    pub fn verify_with_provider(
        &self,
        request: &CanonicalRequest,
        headers: &SignedRequestHeaders,
        provider: &dyn SecretProvider,
    ) -> Result<Context, AuthError> {
        let claimed = decode_context(headers)?;
        let secret = provider.get_secret(&claimed.subject)?;
        self.verify(request, headers, &secret)
    }
}
