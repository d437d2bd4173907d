//! In-memory cache store backed by [`moka`].

mod store;

pub use store::{Expiration, MokaStore};
