//! Canonical request signing and verification for app and user identities.
//!
//! A sender normalizes a request into a deterministic byte string, signs it
//! with HMAC-SHA256 under a shared 64-character secret and attaches the
//! signature, the signing time, the list of signed headers and the identity
//! context (space, environment, and a user or an app) as `x-contentful-*`
//! headers. A receiver rebuilds the same byte string from the wire request,
//! checks the signature in constant time, rejects stale or future-dated
//! signatures and decodes the context.
//!
//! All operations are pure and synchronous; they hold no state and can be
//! called from any number of threads.
//!
//! # Usage
//!
//! ```rust
//! use appsign_auth::{CanonicalRequest, Method, Secret, sign, verify};
//! use appsign_core::{Context, TimeToLive, Timestamp};
//!
//! let request = CanonicalRequest::new(Method::Post, "/entries")
//!     .unwrap()
//!     .with_header("content-type", "application/json")
//!     .unwrap()
//!     .with_body(r#"{"a":1}"#);
//! let secret = Secret::new("a".repeat(64)).unwrap();
//! let context = Context::user("sp1", "env1", "u1").unwrap();
//! let signed_at = Timestamp::from_millis(1_700_000_000_000).unwrap();
//!
//! let headers = sign(&request, &secret, &context, signed_at).unwrap();
//!
//! let now = Timestamp::from_millis(1_700_000_005_000).unwrap();
//! let verified = verify(&request, &headers, &secret, TimeToLive::from_millis(60_000), now).unwrap();
//! assert_eq!(verified, context);
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Normalization and the signing payload
//! - [`error`] - Authentication error types
//! - [`headers`] - Protocol header names, wire header set and metadata decoding
//! - [`request`] - Methods, canonical requests and secrets
//! - [`secrets`] - Secret provider trait and in-memory implementation
//! - [`sign`](mod@sign) - Request signing
//! - [`transport`] - Conversions to and from the `http` crate
//! - [`verify`](mod@verify) - Request verification

pub mod canonical;
pub mod error;
pub mod headers;
pub mod request;
pub mod secrets;
pub mod sign;
pub mod transport;
pub mod verify;

pub use canonical::{NormalizedCanonicalRequest, normalize};
pub use error::AuthError;
pub use headers::{ContentfulHeader, RequestMetadata, SignedRequestHeaders, decode_context};
pub use request::{CanonicalRequest, Method, RawCanonicalRequest, Secret};
pub use secrets::{SecretProvider, StaticSecretProvider};
pub use sign::{sign, sign_now, sign_without_context};
pub use verify::{RequestVerifier, check_freshness, verify, verify_signature};
