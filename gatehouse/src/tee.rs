//! Write-through tee over the response body stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, ready};
use gatehouse_core::ProxyError;
use gatehouse_store::EntryWriter;
use pin_project::pin_project;
use tracing::warn;

/// Body stream adapter that copies each chunk into a cache write stream
/// while forwarding it downstream.
///
/// The cache side is independently fallible: a failed cache write abandons
/// the entry (logged) while downstream delivery continues untouched. An
/// upstream error, or dropping the tee before end of stream, aborts the
/// uncommitted entry.
#[pin_project]
pub struct TeeBody<S> {
    #[pin]
    inner: S,
    writer: Option<EntryWriter>,
}

impl<S> TeeBody<S> {
    /// Tees `inner` into the given cache entry writer.
    pub fn new(inner: S, writer: EntryWriter) -> Self {
        TeeBody {
            inner,
            writer: Some(writer),
        }
    }
}

impl<S> Stream for TeeBody<S>
where
    S: Stream<Item = Result<Bytes, ProxyError>>,
{
    type Item = Result<Bytes, ProxyError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(chunk)) => {
                // Each chunk reaches the cache write stream before it is
                // released downstream.
                if let Some(writer) = this.writer.as_mut() {
                    if let Err(error) = writer.write(chunk.clone()) {
                        warn!(%error, "cache write failed, abandoning entry");
                        *this.writer = None;
                    }
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(error)) => {
                // Dropping the writer without end discards the entry.
                this.writer.take();
                Poll::Ready(Some(Err(error)))
            }
            None => {
                if let Some(writer) = this.writer.take() {
                    if let Err(error) = writer.end() {
                        warn!(%error, "cache entry could not be committed");
                    }
                }
                Poll::Ready(None)
            }
        }
    }
}
