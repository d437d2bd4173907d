//! Proxy body streams.
//!
//! Response bodies flow through the engine as finite, single-shot streams of
//! [`Bytes`] chunks. The head of a response is available synchronously; body
//! chunks arrive over time and are consumed exactly once.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::{self, BoxStream};

use crate::error::ProxyError;
use crate::response::ResponseHead;

/// A single-shot stream of response body chunks.
pub type BodyStream = BoxStream<'static, Result<Bytes, ProxyError>>;

/// An upstream response: a synchronously readable head plus a body stream.
pub struct ProxyResponse {
    /// Status line and headers.
    pub head: ResponseHead,
    /// Body chunks in delivery order.
    pub body: BodyStream,
}

impl ProxyResponse {
    /// Pairs a head with its body stream.
    pub fn new(head: ResponseHead, body: BodyStream) -> Self {
        ProxyResponse { head, body }
    }

    /// Builds a response whose body is already materialized.
    ///
    /// An empty buffer yields a body stream that ends immediately.
    pub fn from_bytes(head: ResponseHead, bytes: Bytes) -> Self {
        let body: BodyStream = if bytes.is_empty() {
            stream::empty().boxed()
        } else {
            stream::iter([Ok(bytes)]).boxed()
        };
        ProxyResponse { head, body }
    }

    /// Drains the body into contiguous bytes.
    pub async fn collect_body(self) -> Result<(ResponseHead, Bytes), ProxyError> {
        let mut body = self.body;
        let mut buffer = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok((self.head, buffer.freeze()))
    }
}

impl std::fmt::Debug for ProxyResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyResponse")
            .field("head", &self.head)
            .field("body", &"...")
            .finish()
    }
}
