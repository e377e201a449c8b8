//! Wire encoding of signatures and identity context as headers.
//!
//! Seven protocol headers carry the signature metadata and the identity
//! context. [`SignedRequestHeaders`] holds them keyed by [`ContentfulHeader`],
//! which is what [`crate::sign`] produces and what [`crate::verify`] consumes.
//! Incoming headers are untrusted, so the type can represent invalid
//! combinations (for example both a user and an app id); they are rejected
//! when the metadata or the context is decoded.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use appsign_core::{AppId, Context, EnvironmentId, SpaceId, Subject, Timestamp, UserId};

use crate::error::AuthError;

/// Minimum number of entries in a signed-headers list: the timestamp and the
/// list itself.
pub const MIN_SIGNED_HEADERS: usize = 2;

/// Length of a hex-encoded HMAC-SHA256 signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// Separator used in the `x-contentful-signed-headers` value.
const SIGNED_HEADERS_SEPARATOR: &str = ",";

/// Protocol header names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentfulHeader {
    /// `x-contentful-timestamp`: epoch-ms signing time.
    Timestamp,
    /// `x-contentful-signed-headers`: comma-joined list of signed header names.
    SignedHeaders,
    /// `x-contentful-signature`: hex HMAC-SHA256.
    Signature,
    /// `x-contentful-space-id`
    SpaceId,
    /// `x-contentful-environment-id`
    EnvironmentId,
    /// `x-contentful-user-id`
    UserId,
    /// `x-contentful-app-id`
    AppId,
}

impl ContentfulHeader {
    /// Every protocol header.
    pub const ALL: [Self; 7] = [
        Self::Timestamp,
        Self::SignedHeaders,
        Self::Signature,
        Self::SpaceId,
        Self::EnvironmentId,
        Self::UserId,
        Self::AppId,
    ];

    /// Headers describing the identity context.
    pub const CONTEXT: [Self; 4] = [Self::SpaceId, Self::EnvironmentId, Self::UserId, Self::AppId];

    /// The lower-case wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timestamp => "x-contentful-timestamp",
            Self::SignedHeaders => "x-contentful-signed-headers",
            Self::Signature => "x-contentful-signature",
            Self::SpaceId => "x-contentful-space-id",
            Self::EnvironmentId => "x-contentful-environment-id",
            Self::UserId => "x-contentful-user-id",
            Self::AppId => "x-contentful-app-id",
        }
    }

    /// Match a header name case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str().eq_ignore_ascii_case(name))
    }

    /// Whether this header carries identity context.
    #[must_use]
    pub fn is_context(self) -> bool {
        Self::CONTEXT.contains(&self)
    }
}

impl FromStr for ContentfulHeader {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| AuthError::InvalidInput(format!("not a protocol header: {s}")))
    }
}

impl fmt::Display for ContentfulHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signature and context headers of a request.
///
/// # Examples
///
/// ```
/// use appsign_auth::{ContentfulHeader, SignedRequestHeaders};
///
/// let headers = SignedRequestHeaders::from_pairs([
///     ("X-Contentful-Timestamp", "1700000000000"),
///     ("content-type", "application/json"),
/// ])
/// .unwrap();
/// assert_eq!(headers.get(ContentfulHeader::Timestamp), Some("1700000000000"));
/// assert_eq!(headers.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedRequestHeaders {
    values: BTreeMap<ContentfulHeader, String>,
}

impl SignedRequestHeaders {
    /// Create an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect protocol headers from arbitrary `(name, value)` pairs, ignoring
    /// every other header.
    ///
    /// # Errors
    /// Returns [`AuthError::MalformedMetadata`] if a protocol header appears
    /// more than once, in any letter case.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, AuthError>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            if let Some(header) = ContentfulHeader::from_name(name.as_ref()) {
                if headers.contains(header) {
                    return Err(AuthError::MalformedMetadata(format!(
                        "{header} header appears more than once"
                    )));
                }
                headers.insert(header, value);
            }
        }
        Ok(headers)
    }

    /// Set a header value.
    pub fn insert(&mut self, header: ContentfulHeader, value: impl Into<String>) {
        self.values.insert(header, value.into());
    }

    /// Remove a header value.
    pub fn remove(&mut self, header: ContentfulHeader) -> Option<String> {
        self.values.remove(&header)
    }

    /// Get a header value.
    #[must_use]
    pub fn get(&self, header: ContentfulHeader) -> Option<&str> {
        self.values.get(&header).map(String::as_str)
    }

    /// Whether a header is present.
    #[must_use]
    pub fn contains(&self, header: ContentfulHeader) -> bool {
        self.values.contains_key(&header)
    }

    /// Iterate headers as `(wire name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.values.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    /// Number of headers present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The signature value, if present.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.get(ContentfulHeader::Signature)
    }

    /// The signed-headers list, split on the separator.
    #[must_use]
    pub fn signed_header_names(&self) -> Vec<&str> {
        self.get(ContentfulHeader::SignedHeaders)
            .map(|list| list.split(SIGNED_HEADERS_SEPARATOR).collect())
            .unwrap_or_default()
    }
}

/// Join header names into the `x-contentful-signed-headers` value.
pub(crate) fn join_signed_headers<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(SIGNED_HEADERS_SEPARATOR)
}

/// The context headers implied by a context, in wire order.
#[must_use]
pub fn context_headers(context: &Context) -> [(ContentfulHeader, &str); 3] {
    let subject = match &context.subject {
        Subject::User(id) => (ContentfulHeader::UserId, id.as_str()),
        Subject::App(id) => (ContentfulHeader::AppId, id.as_str()),
    };
    [
        (ContentfulHeader::SpaceId, context.space_id.as_str()),
        (ContentfulHeader::EnvironmentId, context.environment_id.as_str()),
        subject,
    ]
}

/// Signature metadata extracted from headers and checked for shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    /// The hex signature.
    pub signature: String,
    /// The signing time.
    pub timestamp: Timestamp,
    /// Names of the signed headers, in signing order.
    pub signed_headers: Vec<String>,
}

impl RequestMetadata {
    /// Extract and validate the metadata.
    ///
    /// The signature must be 64 hex characters, the timestamp a decimal
    /// epoch-ms value after 2020-01-01, and the signed-headers list must have
    /// at least two unique entries including the timestamp and the list
    /// itself, but never the signature.
    ///
    /// # Errors
    /// Returns [`AuthError::MalformedMetadata`] on any violation.
    pub fn from_headers(headers: &SignedRequestHeaders) -> Result<Self, AuthError> {
        let signature = headers
            .signature()
            .ok_or_else(|| missing(ContentfulHeader::Signature))?;
        if signature.len() != SIGNATURE_LENGTH || !signature.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AuthError::MalformedMetadata(format!(
                "signature must be {SIGNATURE_LENGTH} hex characters"
            )));
        }

        let raw_timestamp = headers
            .get(ContentfulHeader::Timestamp)
            .ok_or_else(|| missing(ContentfulHeader::Timestamp))?;
        let timestamp = raw_timestamp
            .parse::<i64>()
            .ok()
            .and_then(|ms| Timestamp::from_millis(ms).ok())
            .ok_or_else(|| {
                AuthError::MalformedMetadata(format!("invalid timestamp: {raw_timestamp:?}"))
            })?;

        if !headers.contains(ContentfulHeader::SignedHeaders) {
            return Err(missing(ContentfulHeader::SignedHeaders));
        }
        let signed_headers: Vec<String> = headers
            .signed_header_names()
            .into_iter()
            .map(str::to_ascii_lowercase)
            .collect();
        validate_signed_headers(&signed_headers)?;

        Ok(Self {
            signature: signature.to_ascii_lowercase(),
            timestamp,
            signed_headers,
        })
    }

    /// Whether a header name is covered by the signature.
    #[must_use]
    pub fn is_signed(&self, name: &str) -> bool {
        self.signed_headers.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

fn validate_signed_headers(names: &[String]) -> Result<(), AuthError> {
    if names.len() < MIN_SIGNED_HEADERS {
        return Err(AuthError::MalformedMetadata(format!(
            "signed headers list must contain at least {MIN_SIGNED_HEADERS} entries"
        )));
    }
    for (i, name) in names.iter().enumerate() {
        if name.is_empty() {
            return Err(AuthError::MalformedMetadata(
                "signed headers list contains an empty name".to_owned(),
            ));
        }
        if names[..i].contains(name) {
            return Err(AuthError::MalformedMetadata(format!(
                "signed headers list repeats {name}"
            )));
        }
    }
    for required in [ContentfulHeader::Timestamp, ContentfulHeader::SignedHeaders] {
        if !names.iter().any(|n| n == required.as_str()) {
            return Err(AuthError::MalformedMetadata(format!(
                "signed headers list does not cover {required}"
            )));
        }
    }
    if names.iter().any(|n| n == ContentfulHeader::Signature.as_str()) {
        return Err(AuthError::MalformedMetadata(
            "signature cannot be a signed header".to_owned(),
        ));
    }
    Ok(())
}

fn missing(header: ContentfulHeader) -> AuthError {
    AuthError::MalformedMetadata(format!("missing {header} header"))
}

/// Decode the identity context from headers without checking the signature.
///
/// Space and environment ids are required together with exactly one of a
/// user id or an app id. Use this only to choose which secret to verify
/// with; the result is untrusted until [`crate::verify`] succeeds.
///
/// # Errors
/// Returns [`AuthError::InvalidContext`] if the headers do not form a valid context.
pub fn decode_context(headers: &SignedRequestHeaders) -> Result<Context, AuthError> {
    let space_id = SpaceId::new(required_context(headers, ContentfulHeader::SpaceId)?)
        .map_err(invalid_context)?;
    let environment_id =
        EnvironmentId::new(required_context(headers, ContentfulHeader::EnvironmentId)?)
            .map_err(invalid_context)?;

    let subject = match (
        headers.get(ContentfulHeader::UserId),
        headers.get(ContentfulHeader::AppId),
    ) {
        (Some(user), None) => Subject::User(UserId::new(user).map_err(invalid_context)?),
        (None, Some(app)) => Subject::App(AppId::new(app).map_err(invalid_context)?),
        (Some(_), Some(_)) => {
            return Err(AuthError::InvalidContext(
                "both user id and app id headers are present".to_owned(),
            ));
        }
        (None, None) => {
            return Err(AuthError::InvalidContext(
                "neither user id nor app id header is present".to_owned(),
            ));
        }
    };

    Ok(Context::new(space_id, environment_id, subject))
}

fn required_context(
    headers: &SignedRequestHeaders,
    header: ContentfulHeader,
) -> Result<&str, AuthError> {
    headers
        .get(header)
        .ok_or_else(|| AuthError::InvalidContext(format!("missing {header} header")))
}

fn invalid_context(err: appsign_core::CoreError) -> AuthError {
    AuthError::InvalidContext(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNATURE: &str = "5c1d7c6cbe6bbf0f80e9bca6ec5a5b2f07b0a6b4cb3d5fcd08f9b3b0a4ad8a2f";

    fn valid_headers() -> SignedRequestHeaders {
        let mut headers = SignedRequestHeaders::new();
        headers.insert(ContentfulHeader::Signature, SIGNATURE);
        headers.insert(ContentfulHeader::Timestamp, "1700000000000");
        headers.insert(
            ContentfulHeader::SignedHeaders,
            "content-type,x-contentful-signed-headers,x-contentful-timestamp",
        );
        headers
    }

    #[test]
    fn test_should_match_header_names_case_insensitively() {
        assert_eq!(
            ContentfulHeader::from_name("X-Contentful-App-Id"),
            Some(ContentfulHeader::AppId)
        );
        assert_eq!(ContentfulHeader::from_name("x-contentful-other"), None);
        for header in ContentfulHeader::ALL {
            assert_eq!(header.as_str().parse::<ContentfulHeader>().unwrap(), header);
        }
    }

    #[test]
    fn test_should_classify_context_headers() {
        assert!(ContentfulHeader::SpaceId.is_context());
        assert!(ContentfulHeader::UserId.is_context());
        assert!(!ContentfulHeader::Signature.is_context());
        assert!(!ContentfulHeader::Timestamp.is_context());
    }

    #[test]
    fn test_should_collect_only_protocol_headers_from_pairs() {
        let headers = SignedRequestHeaders::from_pairs([
            ("Host", "example.com"),
            ("X-Contentful-Space-Id", "sp1"),
            ("x-contentful-signature", SIGNATURE),
        ])
        .unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get(ContentfulHeader::SpaceId), Some("sp1"));
        assert_eq!(headers.signature(), Some(SIGNATURE));
    }

    #[test]
    fn test_should_reject_repeated_protocol_header_in_pairs() {
        let result = SignedRequestHeaders::from_pairs([
            ("X-Contentful-User-Id", "u1"),
            ("x-contentful-user-id", "u2"),
        ]);
        assert!(matches!(
            result,
            Err(AuthError::MalformedMetadata(msg)) if msg.contains("x-contentful-user-id")
        ));
    }

    #[test]
    fn test_should_extract_valid_metadata() {
        let metadata = RequestMetadata::from_headers(&valid_headers()).unwrap();
        assert_eq!(metadata.signature, SIGNATURE);
        assert_eq!(metadata.timestamp.as_millis(), 1_700_000_000_000);
        assert_eq!(
            metadata.signed_headers,
            vec![
                "content-type",
                "x-contentful-signed-headers",
                "x-contentful-timestamp"
            ]
        );
        assert!(metadata.is_signed("Content-Type"));
        assert!(!metadata.is_signed("x-contentful-user-id"));
    }

    #[test]
    fn test_should_reject_missing_signature() {
        let mut headers = valid_headers();
        headers.remove(ContentfulHeader::Signature);
        assert!(matches!(
            RequestMetadata::from_headers(&headers),
            Err(AuthError::MalformedMetadata(_))
        ));
    }

    #[test]
    fn test_should_reject_signature_with_wrong_length_or_alphabet() {
        let mut headers = valid_headers();
        headers.insert(ContentfulHeader::Signature, &SIGNATURE[1..]);
        assert!(matches!(
            RequestMetadata::from_headers(&headers),
            Err(AuthError::MalformedMetadata(_))
        ));

        headers.insert(ContentfulHeader::Signature, "z".repeat(64));
        assert!(matches!(
            RequestMetadata::from_headers(&headers),
            Err(AuthError::MalformedMetadata(_))
        ));
    }

    #[test]
    fn test_should_reject_old_or_unparsable_timestamp() {
        let mut headers = valid_headers();
        headers.insert(ContentfulHeader::Timestamp, "1577836800000");
        assert!(matches!(
            RequestMetadata::from_headers(&headers),
            Err(AuthError::MalformedMetadata(_))
        ));

        headers.insert(ContentfulHeader::Timestamp, " 1700000000000");
        assert!(matches!(
            RequestMetadata::from_headers(&headers),
            Err(AuthError::MalformedMetadata(_))
        ));

        headers.insert(ContentfulHeader::Timestamp, "yesterday");
        assert!(matches!(
            RequestMetadata::from_headers(&headers),
            Err(AuthError::MalformedMetadata(_))
        ));
    }

    #[test]
    fn test_should_reject_short_signed_headers_list() {
        let mut headers = valid_headers();
        headers.insert(ContentfulHeader::SignedHeaders, "x-contentful-timestamp");
        assert!(matches!(
            RequestMetadata::from_headers(&headers),
            Err(AuthError::MalformedMetadata(msg)) if msg.contains("at least 2")
        ));
    }

    #[test]
    fn test_should_reject_list_without_timestamp() {
        let mut headers = valid_headers();
        headers.insert(
            ContentfulHeader::SignedHeaders,
            "content-type,x-contentful-signed-headers",
        );
        assert!(matches!(
            RequestMetadata::from_headers(&headers),
            Err(AuthError::MalformedMetadata(msg)) if msg.contains("x-contentful-timestamp")
        ));
    }

    #[test]
    fn test_should_reject_duplicate_or_signature_entries() {
        let mut headers = valid_headers();
        headers.insert(
            ContentfulHeader::SignedHeaders,
            "x-contentful-signed-headers,x-contentful-timestamp,X-Contentful-Timestamp",
        );
        assert!(RequestMetadata::from_headers(&headers).is_err());

        headers.insert(
            ContentfulHeader::SignedHeaders,
            "x-contentful-signature,x-contentful-signed-headers,x-contentful-timestamp",
        );
        assert!(RequestMetadata::from_headers(&headers).is_err());
    }

    #[test]
    fn test_should_decode_user_and_app_contexts() {
        let mut headers = SignedRequestHeaders::new();
        headers.insert(ContentfulHeader::SpaceId, "sp1");
        headers.insert(ContentfulHeader::EnvironmentId, "env1");
        headers.insert(ContentfulHeader::UserId, "u1");
        assert_eq!(
            decode_context(&headers).unwrap(),
            Context::user("sp1", "env1", "u1").unwrap()
        );

        headers.remove(ContentfulHeader::UserId);
        headers.insert(ContentfulHeader::AppId, "a1");
        assert_eq!(
            decode_context(&headers).unwrap(),
            Context::app("sp1", "env1", "a1").unwrap()
        );
    }

    #[test]
    fn test_should_reject_both_or_neither_subject() {
        let mut headers = SignedRequestHeaders::new();
        headers.insert(ContentfulHeader::SpaceId, "sp1");
        headers.insert(ContentfulHeader::EnvironmentId, "env1");
        assert!(matches!(
            decode_context(&headers),
            Err(AuthError::InvalidContext(_))
        ));

        headers.insert(ContentfulHeader::UserId, "u1");
        headers.insert(ContentfulHeader::AppId, "a1");
        assert!(matches!(
            decode_context(&headers),
            Err(AuthError::InvalidContext(_))
        ));
    }

    #[test]
    fn test_should_reject_missing_space_or_empty_ids() {
        let mut headers = SignedRequestHeaders::new();
        headers.insert(ContentfulHeader::EnvironmentId, "env1");
        headers.insert(ContentfulHeader::AppId, "a1");
        assert!(matches!(
            decode_context(&headers),
            Err(AuthError::InvalidContext(_))
        ));

        headers.insert(ContentfulHeader::SpaceId, "");
        assert!(matches!(
            decode_context(&headers),
            Err(AuthError::InvalidContext(_))
        ));

        headers.insert(ContentfulHeader::SpaceId, "sp1 ");
        assert!(matches!(
            decode_context(&headers),
            Err(AuthError::InvalidContext(_))
        ));
    }

    #[test]
    fn test_should_encode_context_headers() {
        let context = Context::app("sp1", "env1", "a1").unwrap();
        assert_eq!(
            context_headers(&context),
            [
                (ContentfulHeader::SpaceId, "sp1"),
                (ContentfulHeader::EnvironmentId, "env1"),
                (ContentfulHeader::AppId, "a1"),
            ]
        );
    }
}
