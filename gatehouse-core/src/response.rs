//! Response metadata exchanged between policies and the cache.

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode, header};
use serde::{Deserialize, Serialize};

/// Status line and headers of an upstream response.
///
/// This is the typed head of a proxied response and of every cache entry:
/// body bytes travel separately as a chunk stream. Heads are serializable so
/// stores can persist them next to the entry body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseHead {
    #[serde(with = "http_serde::status_code")]
    status: StatusCode,
    #[serde(with = "http_serde::header_map")]
    headers: HeaderMap,
}

impl ResponseHead {
    /// Creates a head with the given status and no headers.
    pub fn new(status: StatusCode) -> Self {
        ResponseHead {
            status,
            headers: HeaderMap::new(),
        }
    }

    /// Appends a header, builder style.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the `Content-Type` header value, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_roundtrip_preserves_status_and_headers() {
        let head = ResponseHead::new(StatusCode::OK)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_header(HeaderName::from_static("x-foo"), HeaderValue::from_static("1"));

        let serialized = serde_json::to_string(&head).unwrap();
        let deserialized: ResponseHead = serde_json::from_str(&serialized).unwrap();

        assert_eq!(head, deserialized);
    }

    #[test]
    fn content_type_reads_the_header() {
        let head = ResponseHead::new(StatusCode::OK)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(head.content_type(), Some("application/json"));
        assert_eq!(ResponseHead::new(StatusCode::OK).content_type(), None);
    }
}
