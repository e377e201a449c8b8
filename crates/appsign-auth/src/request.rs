//! Typed request inputs: [`Method`], [`CanonicalRequest`] and [`Secret`].
//!
//! Untyped input (for example JSON) enters through [`RawCanonicalRequest`] and
//! is converted with `TryFrom`, so the signing and verification algorithms only
//! ever see values that already satisfy their structural constraints.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Required length of a [`Secret`], in characters.
pub const SECRET_LENGTH: usize = 64;

/// HTTP methods that can be signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `PATCH`
    Patch,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// `PUT`
    Put,
}

impl Method {
    /// Every signable method.
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Patch,
        Self::Head,
        Self::Post,
        Self::Delete,
        Self::Options,
        Self::Put,
    ];

    /// The upper-case method token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Put => "PUT",
        }
    }
}

impl FromStr for Method {
    type Err = AuthError;

    /// Parse an upper-case method token. Lower-case tokens are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AuthError::InvalidInput(format!("unsupported method: {s}")))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shared signing secret of exactly 64 characters.
///
/// The value is never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Create a secret.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidSecret`] unless `secret` is exactly 64 characters.
    pub fn new(secret: impl Into<String>) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.chars().count() != SECRET_LENGTH {
            return Err(AuthError::InvalidSecret);
        }
        Ok(Self(secret))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl FromStr for Secret {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The logical description of a request: method, path, headers and body.
///
/// Header names are stored lower-cased; two names differing only in case are
/// rejected because they would collapse into one signed header.
///
/// # Examples
///
/// ```
/// use appsign_auth::{CanonicalRequest, Method};
///
/// let request = CanonicalRequest::new(Method::Post, "/entries")
///     .unwrap()
///     .with_header("Content-Type", "application/json")
///     .unwrap()
///     .with_body(r#"{"a":1}"#);
/// assert_eq!(request.header("content-type"), Some("application/json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    method: Method,
    path: String,
    headers: HashMap<String, String>,
    body: Option<String>,
}

impl CanonicalRequest {
    /// Create a request without headers or body.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidInput`] if `path` does not start with `/` or
    /// contains control characters.
    pub fn new(method: Method, path: impl Into<String>) -> Result<Self, AuthError> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(AuthError::InvalidInput(format!(
                "path must start with '/': {path:?}"
            )));
        }
        if path.chars().any(char::is_control) {
            return Err(AuthError::InvalidInput(
                "path must not contain control characters".to_owned(),
            ));
        }
        Ok(Self {
            method,
            path,
            headers: HashMap::new(),
            body: None,
        })
    }

    /// Add a header.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidInput`] if the name is not a valid header
    /// name, the value contains control characters other than tab, or a header
    /// with the same lower-cased name already exists.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let name = normalize_header_name(name.as_ref())?;
        let value = value.into();
        if value.chars().any(|c| c.is_control() && c != '\t') {
            return Err(AuthError::InvalidInput(format!(
                "header {name} contains control characters"
            )));
        }
        if self.headers.contains_key(&name) {
            return Err(AuthError::InvalidInput(format!("duplicate header: {name}")));
        }
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Add several headers.
    ///
    /// # Errors
    /// See [`CanonicalRequest::with_header`].
    pub fn with_headers<K, V>(
        self,
        headers: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, AuthError>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .try_fold(self, |request, (name, value)| request.with_header(name, value))
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// The request path (canonical URI, including any query string).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All headers, keyed by lower-cased name.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Look up a header by name, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The request body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Untyped request description as received from callers or JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCanonicalRequest {
    /// Method token, e.g. `"POST"`.
    pub method: String,
    /// Path, must start with `/`.
    pub path: String,
    /// Optional header mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    /// Optional body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl TryFrom<RawCanonicalRequest> for CanonicalRequest {
    type Error = AuthError;

    fn try_from(raw: RawCanonicalRequest) -> Result<Self, Self::Error> {
        let method: Method = raw.method.parse()?;
        let mut request = Self::new(method, raw.path)?.with_headers(raw.headers.unwrap_or_default())?;
        request.body = raw.body;
        Ok(request)
    }
}

/// Validate a header name and return its lower-cased form.
pub(crate) fn normalize_header_name(name: &str) -> Result<String, AuthError> {
    http::HeaderName::from_bytes(name.as_bytes())
        .map(|n| n.as_str().to_owned())
        .map_err(|_| AuthError::InvalidInput(format!("invalid header name: {name:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_every_method() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
    }

    #[test]
    fn test_should_reject_unknown_or_lowercase_method() {
        assert!(matches!("TRACE".parse::<Method>(), Err(AuthError::InvalidInput(_))));
        assert!(matches!("get".parse::<Method>(), Err(AuthError::InvalidInput(_))));
    }

    #[test]
    fn test_should_require_leading_slash_in_path() {
        assert!(CanonicalRequest::new(Method::Get, "/").is_ok());
        assert!(matches!(
            CanonicalRequest::new(Method::Get, "entries"),
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            CanonicalRequest::new(Method::Get, ""),
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_should_reject_control_characters_in_path() {
        assert!(CanonicalRequest::new(Method::Get, "/a\nb").is_err());
    }

    #[test]
    fn test_should_lowercase_header_names() {
        let request = CanonicalRequest::new(Method::Get, "/")
            .unwrap()
            .with_header("X-Custom", "Value")
            .unwrap();
        assert_eq!(request.headers().get("x-custom").map(String::as_str), Some("Value"));
        assert_eq!(request.header("X-CUSTOM"), Some("Value"));
    }

    #[test]
    fn test_should_reject_headers_differing_only_in_case() {
        let result = CanonicalRequest::new(Method::Get, "/")
            .unwrap()
            .with_headers([("Accept", "a"), ("accept", "b")]);
        assert!(matches!(result, Err(AuthError::InvalidInput(msg)) if msg.contains("duplicate")));
    }

    #[test]
    fn test_should_reject_invalid_header_name_and_value() {
        let base = CanonicalRequest::new(Method::Get, "/").unwrap();
        assert!(base.clone().with_header("bad name", "v").is_err());
        assert!(base.clone().with_header("", "v").is_err());
        assert!(base.clone().with_header("x-a", "line\nbreak").is_err());
        assert!(base.with_header("x-a", "tab\tok").is_ok());
    }

    #[test]
    fn test_should_accept_only_64_character_secrets() {
        assert!(Secret::new("a".repeat(64)).is_ok());
        assert!(matches!(Secret::new("a".repeat(63)), Err(AuthError::InvalidSecret)));
        assert!(matches!(Secret::new("a".repeat(65)), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn test_should_redact_secret_in_debug_output() {
        let secret = Secret::new("s".repeat(64)).unwrap();
        assert_eq!(format!("{secret:?}"), "Secret(<redacted>)");
    }

    #[test]
    fn test_should_convert_raw_request() {
        let raw: RawCanonicalRequest = serde_json::from_str(
            r#"{"method":"POST","path":"/entries","headers":{"Content-Type":"application/json"},"body":"{}"}"#,
        )
        .unwrap();
        let request = CanonicalRequest::try_from(raw).unwrap();
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.path(), "/entries");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body(), Some("{}"));
    }

    #[test]
    fn test_should_reject_raw_request_with_bad_method() {
        let raw = RawCanonicalRequest {
            method: "FETCH".to_owned(),
            path: "/".to_owned(),
            ..RawCanonicalRequest::default()
        };
        assert!(matches!(
            CanonicalRequest::try_from(raw),
            Err(AuthError::InvalidInput(_))
        ));
    }
}
