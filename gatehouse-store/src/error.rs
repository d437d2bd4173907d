//! Error types for cache store operations.

use gatehouse_core::{BoxError, PolicyError};
use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for cache store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal store error, state or computation failure.
    #[error(transparent)]
    Internal(BoxError),

    /// Network interaction error for remote stores.
    #[error(transparent)]
    Connection(BoxError),

    /// The store stopped accepting writes on an open entry stream.
    #[error("cache write stream closed by the store")]
    WriteClosed,
}

impl From<StoreError> for PolicyError {
    fn from(error: StoreError) -> Self {
        PolicyError::Lookup(Box::new(error))
    }
}
