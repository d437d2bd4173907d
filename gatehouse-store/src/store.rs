//! The cache store trait.

use std::time::Duration;

use async_trait::async_trait;
use gatehouse_core::{CacheKey, ResponseHead};

use crate::entry::{EntryStream, EntryWriter};
use crate::error::StoreResult;

/// Asynchronous binary cache store with per-entry time-to-live.
///
/// The store is process-wide and shared by concurrent requests; concurrency
/// safety is the implementation's responsibility. Entries expire `ttl`
/// after they are committed; eviction is the store's job.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Looks up the entry stored under `key`.
    ///
    /// Resolves to `Ok(None)` on a miss. Errors are surfaced to the caller,
    /// never folded into a miss.
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<EntryStream>>;

    /// Opens a write stream for the entry to be stored under `key`.
    ///
    /// The handle is returned synchronously; body chunks are streamed
    /// afterwards and the entry becomes visible only once the writer commits
    /// with `end`. A writer dropped before `end` leaves no entry behind.
    fn put(&self, key: CacheKey, head: ResponseHead, ttl: Duration) -> StoreResult<EntryWriter>;
}
