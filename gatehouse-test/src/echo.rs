//! Counting echo upstream.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use gatehouse::accept;
use gatehouse_core::{ApiRequest, Connector, ProxyError, ProxyResponse, ResponseHead};
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{StatusCode, header};

/// Upstream stub answering every request with a JSON document embedding a
/// monotonically increasing counter.
///
/// A fresh counter value proves a request reached the upstream; a repeated
/// one proves it was served from cache. The response `Content-Type` echoes
/// the request's preferred `Accept` media type, defaulting to
/// `application/json`.
pub struct EchoConnector {
    counter: AtomicUsize,
    status: StatusCode,
    content_type: bool,
    extra_headers: Vec<(HeaderName, HeaderValue)>,
}

impl Default for EchoConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl EchoConnector {
    pub fn new() -> Self {
        EchoConnector {
            counter: AtomicUsize::new(0),
            status: StatusCode::OK,
            content_type: true,
            extra_headers: Vec::new(),
        }
    }

    /// Answers with the given status instead of `200 OK`.
    pub fn with_status(status: StatusCode) -> Self {
        EchoConnector {
            status,
            ..Self::new()
        }
    }

    /// Omits the `Content-Type` header from every response.
    pub fn without_content_type(mut self) -> Self {
        self.content_type = false;
        self
    }

    /// Adds a header to every response.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.extra_headers.push((name, value));
        self
    }

    /// Number of times the upstream was actually called.
    pub fn hits(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for EchoConnector {
    async fn connect(&self, request: ApiRequest) -> Result<ProxyResponse, ProxyError> {
        let counter = self.counter.fetch_add(1, Ordering::SeqCst) + 1;

        let mut head = ResponseHead::new(self.status);
        if self.content_type {
            let media = request
                .header_str(&header::ACCEPT)
                .and_then(accept::preferred)
                .map(|media| media.essence())
                .unwrap_or_else(|| "application/json".to_owned());
            let value = HeaderValue::from_str(&media).map_err(ProxyError::new)?;
            head.headers_mut().insert(CONTENT_TYPE, value);
        }
        for (name, value) in &self.extra_headers {
            head.headers_mut().insert(name.clone(), value.clone());
        }

        let body = format!(
            r#"{{"counter":{},"destination":"{}"}}"#,
            counter,
            request.destination()
        );
        Ok(ProxyResponse::from_bytes(head, Bytes::from(body)))
    }
}
