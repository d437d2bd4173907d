//! The response caching policy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use gatehouse_core::{
    ApiRequest, BodyStream, CacheKey, Policy, PolicyContext, PolicyError, ResponseHead,
};
use gatehouse_store::{CacheStore, EntryStream};
use http::{StatusCode, header};
use tracing::{debug, warn};

use crate::accept;
use crate::config::CachingConfig;
use crate::replay::ReplayInterceptor;
use crate::tee::TeeBody;

/// Attribute telling the response phase whether this request may be cached.
pub const SHOULD_CACHE_ATTR: &str = "caching.should-cache";
/// Attribute holding the working cache key for this request.
pub const CACHE_ID_ATTR: &str = "caching.cache-id";
/// Attribute exposing the head of a replayed cache hit to later policies.
pub const CACHED_RESPONSE_ATTR: &str = "caching.cached-response";

/// Policy that satisfies repeated API calls from previously stored responses.
///
/// The policy straddles both halves of the proxy pipeline. In the request
/// phase it derives the cache key and looks it up in the store: when the
/// `Accept` header names a preferred media type the content-type-qualified
/// key is tried first, falling back to the unqualified key on a miss. A hit
/// installs a [`ReplayInterceptor`] so the upstream connection is never
/// opened, publishes the stored head under [`CACHED_RESPONSE_ATTR`], and
/// disqualifies re-caching. In the response phase a cacheable miss (status
/// `200 OK` within a binding whose TTL is positive) has its key qualified
/// by the response `Content-Type` and its body teed into the store while it
/// streams to the client.
///
/// Each request either replays a stored entry or remains eligible for
/// caching; never both.
#[derive(Debug, Clone)]
pub struct CachingPolicy {
    config: CachingConfig,
}

impl CachingPolicy {
    /// Creates the policy for one configured binding.
    pub fn new(config: CachingConfig) -> Self {
        CachingPolicy { config }
    }

    /// The configuration this binding runs with.
    pub fn config(&self) -> &CachingConfig {
        &self.config
    }

    /// Looks up the unqualified key, installing a replay on a hit.
    async fn lookup_default(
        &self,
        store: &Arc<dyn CacheStore>,
        cache_id: &CacheKey,
        ctx: &mut PolicyContext,
    ) -> Result<(), PolicyError> {
        if let Some(entry) = store.get(cache_id).await? {
            debug!(key = %cache_id, "cache hit on default key");
            install_replay(entry, ctx);
        }
        Ok(())
    }
}

/// Installs the replay interceptor for a hit and disqualifies re-caching.
///
/// The stored head is published before the chain resumes so later policies
/// can inspect what will be replayed.
fn install_replay(entry: EntryStream, ctx: &mut PolicyContext) {
    ctx.set_attribute(CACHED_RESPONSE_ATTR, entry.head().clone());
    ctx.set_connector_interceptor(Arc::new(ReplayInterceptor::new(entry)));
    ctx.set_attribute(SHOULD_CACHE_ATTR, false);
}

#[async_trait]
impl Policy for CachingPolicy {
    async fn on_request(
        &self,
        request: ApiRequest,
        ctx: &mut PolicyContext,
    ) -> Result<ApiRequest, PolicyError> {
        if self.config.ttl == 0 {
            ctx.set_attribute(SHOULD_CACHE_ATTR, false);
            return Ok(request);
        }

        let cache_id = CacheKey::from_request(&request, self.config.include_query_in_key);
        ctx.set_attribute(CACHE_ID_ATTR, cache_id.clone());

        let store: Arc<dyn CacheStore> = ctx.component()?;

        match request.header_str(&header::ACCEPT).and_then(accept::preferred) {
            Some(media) => {
                let suffixed = cache_id.with_content_type(&media.essence());
                debug!(key = %suffixed, "looking up content-typed cache entry");
                match store.get(&suffixed).await? {
                    Some(entry) => {
                        debug!(key = %suffixed, "cache hit on content-typed key");
                        install_replay(entry, ctx);
                    }
                    None => self.lookup_default(&store, &cache_id, ctx).await?,
                }
            }
            None => self.lookup_default(&store, &cache_id, ctx).await?,
        }

        Ok(request)
    }

    async fn on_response(
        &self,
        head: ResponseHead,
        ctx: &mut PolicyContext,
    ) -> Result<ResponseHead, PolicyError> {
        if ctx.attribute_or(SHOULD_CACHE_ATTR, true) {
            if head.status() == StatusCode::OK {
                // Qualify the stored key by the response content type, so a
                // later request negotiating the same type finds it.
                let content_type = head
                    .content_type()
                    .filter(|value| !value.trim().is_empty())
                    .map(str::to_owned);
                if let Some(content_type) = content_type {
                    if let Some(cache_id) = ctx.attribute::<CacheKey>(CACHE_ID_ATTR).cloned() {
                        ctx.set_attribute(CACHE_ID_ATTR, cache_id.with_content_type(&content_type));
                    }
                }
            } else {
                ctx.set_attribute(SHOULD_CACHE_ATTR, false);
            }
        }
        Ok(head)
    }

    fn response_body_handler(
        &self,
        head: &ResponseHead,
        ctx: &mut PolicyContext,
        body: BodyStream,
    ) -> BodyStream {
        if !ctx.attribute_or(SHOULD_CACHE_ATTR, true) {
            return body;
        }
        let Some(cache_id) = ctx.attribute::<CacheKey>(CACHE_ID_ATTR).cloned() else {
            return body;
        };
        // Cache-side trouble from here on must never break response
        // delivery.
        let store: Arc<dyn CacheStore> = match ctx.component() {
            Ok(store) => store,
            Err(_) => return body,
        };
        match store.put(cache_id.clone(), head.clone(), Duration::from_secs(self.config.ttl)) {
            Ok(writer) => {
                debug!(key = %cache_id, ttl_secs = self.config.ttl, "caching response body");
                TeeBody::new(body, writer).boxed()
            }
            Err(error) => {
                warn!(key = %cache_id, %error, "cache write could not be opened, skipping");
                body
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::stream;
    use gatehouse_core::{ApiIdentity, ComponentRegistry};
    use gatehouse_store::{EntryWriter, StoreError, StoreResult};
    use http::header::{ACCEPT, CONTENT_TYPE, HeaderValue};

    use super::*;

    /// Store stub resolving every lookup the same way.
    struct FixedStore {
        entry_body: Option<Bytes>,
        fail: bool,
    }

    #[async_trait]
    impl CacheStore for FixedStore {
        async fn get(&self, _key: &CacheKey) -> StoreResult<Option<EntryStream>> {
            if self.fail {
                return Err(StoreError::Internal("injected".into()));
            }
            Ok(self.entry_body.clone().map(|body| {
                let head = ResponseHead::new(StatusCode::OK)
                    .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                EntryStream::from_bytes(head, body)
            }))
        }

        fn put(
            &self,
            _key: CacheKey,
            _head: ResponseHead,
            _ttl: Duration,
        ) -> StoreResult<EntryWriter> {
            Err(StoreError::Internal("not used".into()))
        }
    }

    fn ctx_with_store(store: FixedStore) -> PolicyContext {
        let mut registry = ComponentRegistry::new();
        let store: Arc<dyn CacheStore> = Arc::new(store);
        registry.register(store);
        PolicyContext::new(Arc::new(registry))
    }

    fn empty_ctx() -> PolicyContext {
        PolicyContext::new(Arc::new(ComponentRegistry::new()))
    }

    fn request() -> ApiRequest {
        ApiRequest::builder(ApiIdentity::Contract {
            api_key: "key".into(),
        })
        .destination("/resource")
        .header(ACCEPT, HeaderValue::from_static("application/json"))
        .build()
    }

    fn policy(ttl: u64) -> CachingPolicy {
        CachingPolicy::new(CachingConfig {
            ttl,
            include_query_in_key: false,
        })
    }

    #[tokio::test]
    async fn zero_ttl_skips_the_store_entirely() {
        // No store registered: a lookup attempt would fail loudly.
        let mut ctx = empty_ctx();
        let result = policy(0).on_request(request(), &mut ctx).await;

        assert!(result.is_ok());
        assert!(!ctx.attribute_or(SHOULD_CACHE_ATTR, true));
        assert!(ctx.connector_interceptor().is_none());
    }

    #[tokio::test]
    async fn a_hit_installs_replay_and_publishes_the_head() {
        let mut ctx = ctx_with_store(FixedStore {
            entry_body: Some(Bytes::from_static(b"{}")),
            fail: false,
        });
        policy(60).on_request(request(), &mut ctx).await.unwrap();

        assert!(ctx.connector_interceptor().is_some());
        assert!(!ctx.attribute_or(SHOULD_CACHE_ATTR, true));
        let head = ctx
            .attribute::<ResponseHead>(CACHED_RESPONSE_ATTR)
            .expect("cached head published");
        assert_eq!(head.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn a_miss_leaves_the_request_cacheable() {
        let mut ctx = ctx_with_store(FixedStore {
            entry_body: None,
            fail: false,
        });
        policy(60).on_request(request(), &mut ctx).await.unwrap();

        assert!(ctx.connector_interceptor().is_none());
        assert!(ctx.attribute_or(SHOULD_CACHE_ATTR, true));
        assert!(ctx.attribute::<CacheKey>(CACHE_ID_ATTR).is_some());
    }

    #[tokio::test]
    async fn store_errors_are_fatal_in_the_request_phase() {
        let mut ctx = ctx_with_store(FixedStore {
            entry_body: None,
            fail: true,
        });
        let result = policy(60).on_request(request(), &mut ctx).await;

        assert!(matches!(result, Err(PolicyError::Lookup(_))));
    }

    #[tokio::test]
    async fn missing_store_is_fatal_in_the_request_phase() {
        let mut ctx = empty_ctx();
        let result = policy(60).on_request(request(), &mut ctx).await;

        assert!(matches!(result, Err(PolicyError::ComponentMissing(_))));
    }

    #[tokio::test]
    async fn non_200_responses_are_disqualified() {
        let mut ctx = empty_ctx();
        ctx.set_attribute(CACHE_ID_ATTR, CacheKey::from("key:GET:/resource"));

        let head = ResponseHead::new(StatusCode::INTERNAL_SERVER_ERROR);
        policy(60).on_response(head, &mut ctx).await.unwrap();

        assert!(!ctx.attribute_or(SHOULD_CACHE_ATTR, true));
    }

    #[tokio::test]
    async fn the_response_content_type_qualifies_the_key() {
        let mut ctx = empty_ctx();
        let bare = CacheKey::from("key:GET:/resource");
        ctx.set_attribute(CACHE_ID_ATTR, bare.clone());

        let head = ResponseHead::new(StatusCode::OK)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("Application/JSON"));
        policy(60).on_response(head, &mut ctx).await.unwrap();

        let qualified = ctx.attribute::<CacheKey>(CACHE_ID_ATTR).unwrap();
        assert_eq!(*qualified, bare.with_content_type("application/json"));
    }

    #[tokio::test]
    async fn a_blank_content_type_keeps_the_bare_key() {
        let mut ctx = empty_ctx();
        let bare = CacheKey::from("key:GET:/resource");
        ctx.set_attribute(CACHE_ID_ATTR, bare.clone());

        let head = ResponseHead::new(StatusCode::OK)
            .with_header(CONTENT_TYPE, HeaderValue::from_static(" "));
        policy(60).on_response(head, &mut ctx).await.unwrap();

        assert_eq!(*ctx.attribute::<CacheKey>(CACHE_ID_ATTR).unwrap(), bare);
        assert!(ctx.attribute_or(SHOULD_CACHE_ATTR, true));
    }

    #[tokio::test]
    async fn body_handler_degrades_without_a_cache_id() {
        let mut ctx = empty_ctx();
        let head = ResponseHead::new(StatusCode::OK);
        let body: BodyStream = stream::iter([Ok(Bytes::from_static(b"payload"))]).boxed();

        let mut out = policy(60).response_body_handler(&head, &mut ctx, body);
        assert_eq!(out.next().await.unwrap().unwrap(), Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn body_handler_degrades_without_a_store_component() {
        let mut ctx = empty_ctx();
        ctx.set_attribute(CACHE_ID_ATTR, CacheKey::from("key:GET:/resource"));
        let head = ResponseHead::new(StatusCode::OK);
        let body: BodyStream = stream::iter([Ok(Bytes::from_static(b"payload"))]).boxed();

        let mut out = policy(60).response_body_handler(&head, &mut ctx, body);
        assert_eq!(out.next().await.unwrap().unwrap(), Bytes::from_static(b"payload"));
    }
}
