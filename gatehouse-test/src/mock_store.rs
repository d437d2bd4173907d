//! Instrumented in-memory cache store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gatehouse_core::{CacheKey, ResponseHead};
use gatehouse_store::{CacheStore, EntryStream, EntryWriter, StoreError, StoreResult, WriteSink};

#[derive(Clone, Debug)]
struct StoredEntry {
    head: ResponseHead,
    body: Bytes,
    expires_at: DateTime<Utc>,
}

/// Interaction counters for assertions.
#[derive(Debug, Default)]
pub struct StoreCounters {
    read_count: AtomicUsize,
    read_hit_count: AtomicUsize,
    read_miss_count: AtomicUsize,
    write_count: AtomicUsize,
}

impl StoreCounters {
    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }

    pub fn read_hit_count(&self) -> usize {
        self.read_hit_count.load(Ordering::SeqCst)
    }

    pub fn read_miss_count(&self) -> usize {
        self.read_miss_count.load(Ordering::SeqCst)
    }

    /// Number of committed entries. Aborted writes are not counted.
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.read_count.store(0, Ordering::SeqCst);
        self.read_hit_count.store(0, Ordering::SeqCst);
        self.read_miss_count.store(0, Ordering::SeqCst);
        self.write_count.store(0, Ordering::SeqCst);
    }
}

/// In-memory [`CacheStore`] with interaction counters and fault injection.
///
/// Entries expire by wall-clock timestamp; an expired entry is removed on
/// the next lookup. Writes commit synchronously when the entry writer ends.
#[derive(Clone, Debug, Default)]
pub struct MockStore {
    entries: Arc<DashMap<CacheKey, StoredEntry>>,
    counters: Arc<StoreCounters>,
    fail_lookups: Arc<AtomicBool>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent lookup fail with a store error.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn counters(&self) -> &StoreCounters {
        &self.counters
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }
}

struct MockSink {
    entries: Arc<DashMap<CacheKey, StoredEntry>>,
    counters: Arc<StoreCounters>,
    key: CacheKey,
    head: ResponseHead,
    expires_at: DateTime<Utc>,
    buffer: BytesMut,
}

impl WriteSink for MockSink {
    fn write(&mut self, chunk: Bytes) -> StoreResult<()> {
        self.buffer.extend_from_slice(&chunk);
        Ok(())
    }

    fn end(&mut self) -> StoreResult<()> {
        self.counters.write_count.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(
            self.key.clone(),
            StoredEntry {
                head: self.head.clone(),
                body: self.buffer.split().freeze(),
                expires_at: self.expires_at,
            },
        );
        Ok(())
    }

    fn abort(&mut self) {
        self.buffer.clear();
    }
}

#[async_trait]
impl CacheStore for MockStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<EntryStream>> {
        self.counters.read_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Internal("injected lookup failure".into()));
        }
        match self.entries.get(key).map(|entry| entry.value().clone()) {
            Some(entry) if entry.expires_at > Utc::now() => {
                self.counters.read_hit_count.fetch_add(1, Ordering::SeqCst);
                Ok(Some(EntryStream::from_bytes(entry.head, entry.body)))
            }
            Some(_) => {
                self.entries.remove(key);
                self.counters.read_miss_count.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
            None => {
                self.counters.read_miss_count.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
        }
    }

    fn put(&self, key: CacheKey, head: ResponseHead, ttl: Duration) -> StoreResult<EntryWriter> {
        let expires_at = Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64);
        Ok(EntryWriter::new(MockSink {
            entries: Arc::clone(&self.entries),
            counters: Arc::clone(&self.counters),
            key,
            head,
            expires_at,
            buffer: BytesMut::new(),
        }))
    }
}
