//! Cache store abstraction for the gatehouse engine.
//!
//! A [`CacheStore`] holds binary response entries under byte-stable keys
//! with a per-entry time-to-live. Entries are exchanged as streams: reads
//! produce an [`EntryStream`] whose head is synchronously readable and whose
//! body arrives as chunks, writes go through an [`EntryWriter`] that commits
//! the entry only on a clean `end`.

mod entry;
mod error;
mod store;

pub use entry::{EntryBody, EntryStream, EntryWriter, WriteSink};
pub use error::{StoreError, StoreResult};
pub use store::CacheStore;
