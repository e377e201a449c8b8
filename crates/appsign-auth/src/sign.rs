//! Request signing.
//!
//! [`sign`] covers every header of the [`CanonicalRequest`] plus the
//! timestamp, the signed-headers list itself and the identity context
//! headers. The signed-headers list is the sorted, comma-joined set of those
//! names, so it always contains at least the timestamp and the list.

use appsign_core::{Context, Timestamp};
use tracing::debug;

use crate::canonical::{compute_signature, normalize};
use crate::error::AuthError;
use crate::headers::{ContentfulHeader, SignedRequestHeaders, context_headers, join_signed_headers};
use crate::request::{CanonicalRequest, Secret};

/// Sign a request on behalf of a user or app.
///
/// Returns the timestamp, signed-headers and signature headers plus the
/// space, environment and user-or-app headers for `context`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] if the request already carries one of
/// the protocol headers.
///
/// # Examples
///
/// ```
/// use appsign_auth::{CanonicalRequest, ContentfulHeader, Method, Secret, sign};
/// use appsign_core::{Context, Timestamp};
///
/// let request = CanonicalRequest::new(Method::Get, "/entries").unwrap();
/// let secret = Secret::new("a".repeat(64)).unwrap();
/// let context = Context::app("sp1", "env1", "app1").unwrap();
/// let timestamp = Timestamp::from_millis(1_700_000_000_000).unwrap();
///
/// let headers = sign(&request, &secret, &context, timestamp).unwrap();
/// assert_eq!(headers.get(ContentfulHeader::AppId), Some("app1"));
/// assert_eq!(headers.signature().map(str::len), Some(64));
/// ```
pub fn sign(
    request: &CanonicalRequest,
    secret: &Secret,
    context: &Context,
    timestamp: Timestamp,
) -> Result<SignedRequestHeaders, AuthError> {
    sign_inner(request, secret, Some(context), timestamp)
}

/// Sign a request without identity context.
///
/// Produces only the timestamp, signed-headers and signature headers.
///
/// # Errors
///
/// See [`sign`].
pub fn sign_without_context(
    request: &CanonicalRequest,
    secret: &Secret,
    timestamp: Timestamp,
) -> Result<SignedRequestHeaders, AuthError> {
    sign_inner(request, secret, None, timestamp)
}

/// Sign a request with the current wall-clock time.
///
/// # Errors
///
/// See [`sign`]. Also returns [`AuthError::InvalidInput`] if the system clock
/// is set before 2020.
pub fn sign_now(
    request: &CanonicalRequest,
    secret: &Secret,
    context: &Context,
) -> Result<SignedRequestHeaders, AuthError> {
    sign(request, secret, context, Timestamp::now()?)
}

fn sign_inner(
    request: &CanonicalRequest,
    secret: &Secret,
    context: Option<&Context>,
    timestamp: Timestamp,
) -> Result<SignedRequestHeaders, AuthError> {
    if let Some(name) = request
        .headers()
        .keys()
        .find(|name| ContentfulHeader::from_name(name).is_some())
    {
        return Err(AuthError::InvalidInput(format!(
            "request already carries protocol header {name}"
        )));
    }

    let mut headers = SignedRequestHeaders::new();
    headers.insert(ContentfulHeader::Timestamp, timestamp.to_string());
    if let Some(context) = context {
        for (header, value) in context_headers(context) {
            headers.insert(header, value);
        }
    }

    let mut signed_names: Vec<&str> = request
        .headers()
        .keys()
        .map(String::as_str)
        .chain(headers.iter().map(|(name, _)| name))
        .chain(std::iter::once(ContentfulHeader::SignedHeaders.as_str()))
        .collect();
    signed_names.sort_unstable();
    let signed_list = join_signed_headers(&signed_names);
    headers.insert(ContentfulHeader::SignedHeaders, signed_list);

    let covered = request.clone().with_headers(headers.iter())?;
    let signature = compute_signature(&normalize(&covered), secret);

    debug!(
        method = %request.method(),
        path = request.path(),
        %timestamp,
        signed_headers = headers.get(ContentfulHeader::SignedHeaders).unwrap_or_default(),
        "Signed request"
    );

    headers.insert(ContentfulHeader::Signature, signature);
    Ok(headers)
}
