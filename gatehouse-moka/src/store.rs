use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use gatehouse_core::{CacheKey, ResponseHead};
use gatehouse_store::{CacheStore, EntryStream, EntryWriter, StoreResult, WriteSink};
use moka::{Expiry, sync::Cache};

/// A committed cache entry held in memory.
#[derive(Clone, Debug)]
struct StoredEntry {
    head: ResponseHead,
    body: Bytes,
    ttl: Duration,
}

/// Per-entry expiry policy reading the TTL recorded at write time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Expiration;

impl Expiry<CacheKey, StoredEntry> for Expiration {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // Use the NEW value's TTL, not the remaining lifetime of the old one.
        Some(value.ttl)
    }
}

/// In-memory [`CacheStore`] with per-entry TTL eviction.
#[derive(Clone)]
pub struct MokaStore {
    cache: Cache<CacheKey, StoredEntry>,
}

impl MokaStore {
    /// Creates a store bounded to `max_capacity` entries.
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(Expiration)
            .build();
        MokaStore { cache }
    }
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

struct MokaSink {
    cache: Cache<CacheKey, StoredEntry>,
    key: CacheKey,
    head: ResponseHead,
    ttl: Duration,
    buffer: BytesMut,
}

impl WriteSink for MokaSink {
    fn write(&mut self, chunk: Bytes) -> StoreResult<()> {
        self.buffer.extend_from_slice(&chunk);
        Ok(())
    }

    fn end(&mut self) -> StoreResult<()> {
        let entry = StoredEntry {
            head: self.head.clone(),
            body: self.buffer.split().freeze(),
            ttl: self.ttl,
        };
        self.cache.insert(self.key.clone(), entry);
        Ok(())
    }

    fn abort(&mut self) {
        self.buffer.clear();
    }
}

#[async_trait]
impl CacheStore for MokaStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<EntryStream>> {
        Ok(self
            .cache
            .get(key)
            .map(|entry| EntryStream::from_bytes(entry.head, entry.body)))
    }

    fn put(&self, key: CacheKey, head: ResponseHead, ttl: Duration) -> StoreResult<EntryWriter> {
        Ok(EntryWriter::new(MokaSink {
            cache: self.cache.clone(),
            key,
            head,
            ttl,
            buffer: BytesMut::new(),
        }))
    }
}
