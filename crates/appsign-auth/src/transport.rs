//! Conversions between the signing types and the `http` crate.
//!
//! These helpers sit at the transport boundary: they turn an incoming
//! `http::request::Parts` into a [`CanonicalRequest`] and
//! [`SignedRequestHeaders`], and attach signed headers to an outgoing
//! `http::HeaderMap`.

use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::AuthError;
use crate::headers::{ContentfulHeader, SignedRequestHeaders};
use crate::request::{CanonicalRequest, Method};

impl TryFrom<&http::Method> for Method {
    type Error = AuthError;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Patch => Self::PATCH,
            Method::Head => Self::HEAD,
            Method::Post => Self::POST,
            Method::Delete => Self::DELETE,
            Method::Options => Self::OPTIONS,
            Method::Put => Self::PUT,
        }
    }
}

impl CanonicalRequest {
    /// Build a canonical request from received request parts.
    ///
    /// The path includes the query string. Every header except the protocol
    /// headers is copied; repeated header values are joined with `,`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if the method is not signable or a
    /// header value is not visible ASCII.
    pub fn from_http_parts(
        parts: &http::request::Parts,
        body: Option<String>,
    ) -> Result<Self, AuthError> {
        let method = Method::try_from(&parts.method)?;
        let path = parts
            .uri
            .path_and_query()
            .map_or("/", http::uri::PathAndQuery::as_str);

        let mut request = Self::new(method, path)?;
        for name in parts.headers.keys() {
            if ContentfulHeader::from_name(name.as_str()).is_some() {
                continue;
            }
            let values = parts
                .headers
                .get_all(name)
                .iter()
                .map(|v| {
                    v.to_str().map_err(|_| {
                        AuthError::InvalidInput(format!("header {name} is not visible ASCII"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            request = request.with_header(name.as_str(), values.join(","))?;
        }

        Ok(match body {
            Some(body) => request.with_body(body),
            None => request,
        })
    }
}

impl SignedRequestHeaders {
    /// Collect the protocol headers from a header map.
    ///
    /// Values that are not visible ASCII are skipped and will surface as
    /// missing headers during verification.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedMetadata`] if a protocol header carries
    /// more than one value.
    pub fn from_header_map(headers: &HeaderMap) -> Result<Self, AuthError> {
        Self::from_pairs(
            headers
                .iter()
                .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v))),
        )
    }

    /// Insert these headers into a header map, replacing existing values.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if a value cannot be encoded as a header value.
    pub fn write_to(&self, target: &mut HeaderMap) -> Result<(), AuthError> {
        for (name, value) in self.iter() {
            let value = HeaderValue::from_str(value).map_err(|_| {
                AuthError::InvalidInput(format!("value of {name} is not a valid header value"))
            })?;
            target.insert(HeaderName::from_static(name), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use appsign_core::{Context, TimeToLive, Timestamp};

    use super::*;
    use crate::request::Secret;
    use crate::sign::sign;
    use crate::verify::verify;

    fn secret() -> Secret {
        Secret::new("a".repeat(64)).unwrap()
    }

    #[test]
    fn test_should_convert_http_methods() {
        assert_eq!(Method::try_from(&http::Method::PATCH).unwrap(), Method::Patch);
        assert!(Method::try_from(&http::Method::TRACE).is_err());
        assert_eq!(http::Method::from(Method::Delete), http::Method::DELETE);
    }

    #[test]
    fn test_should_build_canonical_request_from_parts() {
        let (parts, _body) = http::Request::builder()
            .method("POST")
            .uri("http://example.com/entries?limit=1")
            .header("Content-Type", "application/json")
            .header("accept", "a")
            .header("accept", "b")
            .header("x-contentful-signature", "ignored")
            .body(())
            .unwrap()
            .into_parts();

        let request = CanonicalRequest::from_http_parts(&parts, Some("{}".to_owned())).unwrap();
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.path(), "/entries?limit=1");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("accept"), Some("a,b"));
        assert_eq!(request.header("x-contentful-signature"), None);
        assert_eq!(request.body(), Some("{}"));
    }

    #[test]
    fn test_should_sign_and_verify_over_http_types() {
        let outgoing = CanonicalRequest::new(Method::Put, "/entries/1")
            .unwrap()
            .with_header("content-type", "application/json")
            .unwrap()
            .with_body("{}");
        let context = Context::app("sp1", "master", "app1").unwrap();
        let signed_at = Timestamp::from_millis(1_700_000_000_000).unwrap();
        let signed = sign(&outgoing, &secret(), &context, signed_at).unwrap();

        let mut builder = http::Request::builder()
            .method("PUT")
            .uri("/entries/1")
            .header("content-type", "application/json")
            .header("user-agent", "test");
        let headers = builder.headers_mut().unwrap();
        signed.write_to(headers).unwrap();
        let (parts, _body) = builder.body(()).unwrap().into_parts();

        let received = CanonicalRequest::from_http_parts(&parts, Some("{}".to_owned())).unwrap();
        let received_headers = SignedRequestHeaders::from_header_map(&parts.headers).unwrap();
        assert_eq!(received_headers, signed);

        let verified = verify(
            &received,
            &received_headers,
            &secret(),
            TimeToLive::DEFAULT,
            signed_at,
        )
        .unwrap();
        assert_eq!(verified, context);
    }

    #[test]
    fn test_should_reject_repeated_protocol_header_in_map() {
        let mut map = HeaderMap::new();
        map.append("x-contentful-app-id", HeaderValue::from_static("a1"));
        map.append("x-contentful-app-id", HeaderValue::from_static("a2"));
        assert!(matches!(
            SignedRequestHeaders::from_header_map(&map),
            Err(AuthError::MalformedMetadata(_))
        ));
    }

    #[test]
    fn test_should_reject_unencodable_header_value() {
        let mut headers = SignedRequestHeaders::new();
        headers.insert(ContentfulHeader::UserId, "bad\u{7f}value");
        let mut target = HeaderMap::new();
        assert!(matches!(
            headers.write_to(&mut target),
            Err(AuthError::InvalidInput(_))
        ));
    }
}
