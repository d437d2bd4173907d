//! Error types shared across the engine.

use thiserror::Error;

/// Boxed error cause carried inside engine errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error aborting the policy chain for a single request.
///
/// Returned from the request or response phase of a [`Policy`]; the engine
/// stops applying the chain and fails the proxied call.
///
/// [`Policy`]: crate::Policy
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A component required by a policy is not registered with the engine.
    #[error("required component not registered: {0}")]
    ComponentMissing(&'static str),

    /// A cache lookup failed during the request phase.
    ///
    /// Lookup failures are fatal to the request; a store error is never
    /// silently treated as a cache miss.
    #[error("cache lookup failed: {0}")]
    Lookup(#[source] BoxError),
}

/// Data-plane error carried by proxy body streams and upstream connectors.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ProxyError(BoxError);

impl ProxyError {
    /// Wraps an arbitrary transport or replay failure.
    pub fn new(cause: impl Into<BoxError>) -> Self {
        ProxyError(cause.into())
    }
}
