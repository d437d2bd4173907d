//! Single-request pipeline harness.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use gatehouse_core::{
    ApiRequest, ComponentRegistry, Connector, Policy, PolicyContext, PolicyError, ProxyError,
    ProxyResponse, ResponseHead,
};
use gatehouse_store::CacheStore;

/// Error from a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A policy aborted the chain.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// The upstream transport (real or replayed) failed.
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

/// Drives a single policy through the proxy pipeline the way the gateway
/// chain would: request phase, connector (intercepted or real), response
/// phase, response body handler, body collection. For one request every
/// stage runs strictly after the previous one.
pub struct TestGateway<P, C> {
    policy: P,
    connector: Arc<C>,
    components: Arc<ComponentRegistry>,
}

impl<P, C> TestGateway<P, C>
where
    P: Policy,
    C: Connector + 'static,
{
    /// Builds a pipeline with the given cache store registered.
    pub fn new(policy: P, connector: C, store: Arc<dyn CacheStore>) -> Self {
        let mut components = ComponentRegistry::new();
        components.register(store);
        TestGateway {
            policy,
            connector: Arc::new(connector),
            components: Arc::new(components),
        }
    }

    /// Builds a pipeline with no cache store component.
    pub fn without_store(policy: P, connector: C) -> Self {
        TestGateway {
            policy,
            connector: Arc::new(connector),
            components: Arc::new(ComponentRegistry::new()),
        }
    }

    /// The upstream connector, for interaction assertions.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Proxies one request and collects the response.
    pub async fn send(&self, request: ApiRequest) -> Result<(ResponseHead, Bytes), GatewayError> {
        let mut ctx = PolicyContext::new(Arc::clone(&self.components));

        let request = self.policy.on_request(request, &mut ctx).await?;

        let ProxyResponse { head, body } = match ctx.connector_interceptor() {
            Some(interceptor) => interceptor.connector().connect(request).await?,
            None => self.connector.connect(request).await?,
        };

        let head = self.policy.on_response(head, &mut ctx).await?;
        let mut body = self.policy.response_body_handler(&head, &mut ctx, body);

        let mut buffer = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok((head, buffer.freeze()))
    }
}
