//! Error types for request signing and verification.
//!
//! All failures are represented by [`AuthError`]. Callers should map every
//! variant for which [`AuthError::is_authentication_failure`] returns `true`
//! to the same generic "unauthorized" response and keep the detail for
//! internal logs only.

use appsign_core::CoreError;

/// Errors that can occur while signing or verifying a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A method, path, header, timestamp or TTL violates its structural constraints.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The secret is not exactly 64 characters long.
    #[error("Invalid secret: must be exactly 64 characters")]
    InvalidSecret,

    /// Signature headers are present but do not have the expected shape.
    #[error("Malformed signature metadata: {0}")]
    MalformedMetadata(String),

    /// The signature is older than the accepted time-to-live.
    #[error("Request has expired: age {age_ms}ms exceeds ttl {ttl_ms}ms")]
    Expired {
        /// Milliseconds between the signing time and verification time.
        age_ms: u64,
        /// The accepted window in milliseconds.
        ttl_ms: u64,
    },

    /// The signing time lies in the future relative to the verifier's clock.
    #[error("Request is not yet valid: signed at {timestamp}, now {now}")]
    NotYetValid {
        /// The signing time in epoch milliseconds.
        timestamp: u64,
        /// The verification time in epoch milliseconds.
        now: u64,
    },

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureMismatch,

    /// Context headers do not describe exactly one user or app in a space and environment.
    #[error("Invalid context: {0}")]
    InvalidContext(String),

    /// No secret is registered for the request subject.
    #[error("No secret found for subject: {0}")]
    UnknownSubject(String),
}

impl AuthError {
    /// Whether this error must be reported to the sender as a generic authentication failure.
    ///
    /// Only [`AuthError::InvalidInput`] and [`AuthError::InvalidSecret`] describe
    /// caller bugs on the local side; everything else is a rejected request.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        !matches!(self, Self::InvalidInput(_) | Self::InvalidSecret)
    }
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
