//! Entry streams exchanged with cache stores.

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use gatehouse_core::ResponseHead;

use crate::error::{StoreError, StoreResult};

/// Body chunks of a stored entry.
pub type EntryBody = BoxStream<'static, StoreResult<Bytes>>;

/// A cache entry as produced by a store.
///
/// The head is synchronously readable; the body is a lazy, finite,
/// single-shot stream of zero or more chunks followed by end of stream.
pub struct EntryStream {
    head: ResponseHead,
    body: EntryBody,
}

impl EntryStream {
    /// Pairs a stored head with its body stream.
    pub fn new(head: ResponseHead, body: EntryBody) -> Self {
        EntryStream { head, body }
    }

    /// Builds an entry whose body is already materialized.
    pub fn from_bytes(head: ResponseHead, bytes: Bytes) -> Self {
        let body: EntryBody = if bytes.is_empty() {
            stream::empty().boxed()
        } else {
            stream::iter([Ok(bytes)]).boxed()
        };
        EntryStream { head, body }
    }

    /// The stored response head.
    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    /// Splits the entry into head and body stream.
    pub fn into_parts(self) -> (ResponseHead, EntryBody) {
        (self.head, self.body)
    }
}

impl std::fmt::Debug for EntryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStream")
            .field("head", &self.head)
            .field("body", &"...")
            .finish()
    }
}

/// Store-side receiver of a streamed entry write.
///
/// Implemented by store backends. `write` receives chunks in order, `end`
/// commits the entry, and `abort` discards everything buffered so far.
/// Exactly one of `end` or `abort` is called per sink.
pub trait WriteSink: Send {
    /// Receives one body chunk.
    fn write(&mut self, chunk: Bytes) -> StoreResult<()>;

    /// Commits the entry.
    fn end(&mut self) -> StoreResult<()>;

    /// Discards the uncommitted entry.
    fn abort(&mut self);
}

/// Write handle for a cache entry under construction.
///
/// Obtained synchronously from [`CacheStore::put`]; chunks are streamed
/// through [`write`](EntryWriter::write) and the entry becomes visible only
/// once [`end`](EntryWriter::end) commits it. Dropping the writer without
/// calling `end` aborts the entry: an unended write stream never produces
/// a stored value, regardless of TTL.
///
/// [`CacheStore::put`]: crate::CacheStore::put
pub struct EntryWriter {
    sink: Option<Box<dyn WriteSink>>,
}

impl EntryWriter {
    /// Wraps a store-side sink.
    pub fn new(sink: impl WriteSink + 'static) -> Self {
        EntryWriter {
            sink: Some(Box::new(sink)),
        }
    }

    /// Streams one body chunk into the entry.
    pub fn write(&mut self, chunk: Bytes) -> StoreResult<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.write(chunk),
            None => Err(StoreError::WriteClosed),
        }
    }

    /// Commits the entry.
    pub fn end(mut self) -> StoreResult<()> {
        match self.sink.take() {
            Some(mut sink) => sink.end(),
            None => Err(StoreError::WriteClosed),
        }
    }
}

impl Drop for EntryWriter {
    fn drop(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.abort();
        }
    }
}

impl std::fmt::Debug for EntryWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryWriter")
            .field("open", &self.sink.is_some())
            .finish()
    }
}
