//! Response caching policy for the gatehouse engine.
//!
//! [`CachingPolicy`] short-circuits repeated API calls with previously
//! stored responses. On the request path it fingerprints the call into a
//! [`CacheKey`] and looks it up in the configured [`CacheStore`], preferring
//! a key qualified by the `Accept` header's best media type and falling back
//! to the unqualified key. On a hit it installs a connector interceptor that
//! replays the stored entry instead of contacting the backend API. On the
//! response path, a miss that came back `200 OK` is teed into the store
//! while the body streams to the client.
//!
//! [`CacheKey`]: gatehouse_core::CacheKey
//! [`CacheStore`]: gatehouse_store::CacheStore

pub mod accept;
pub mod config;
pub mod policy;
pub mod replay;
pub mod tee;

pub use config::CachingConfig;
pub use policy::{CACHE_ID_ATTR, CACHED_RESPONSE_ATTR, CachingPolicy, SHOULD_CACHE_ATTR};
pub use replay::ReplayInterceptor;
pub use tee::TeeBody;
