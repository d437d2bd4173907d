//! Upstream connector abstraction.
//!
//! A [`Connector`] is the transport that turns a proxied request into its
//! upstream response. The engine normally resolves a connector from the API
//! registration; a policy may replace it for one request by installing a
//! [`ConnectorInterceptor`] on the request context.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProxyError;
use crate::io::ProxyResponse;
use crate::request::ApiRequest;

/// Transport producing the upstream response for a proxied request.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Sends the request upstream and resolves its response.
    async fn connect(&self, request: ApiRequest) -> Result<ProxyResponse, ProxyError>;
}

#[async_trait]
impl<T> Connector for Arc<T>
where
    T: Connector + ?Sized,
{
    async fn connect(&self, request: ApiRequest) -> Result<ProxyResponse, ProxyError> {
        self.as_ref().connect(request).await
    }
}

#[async_trait]
impl<T> Connector for Box<T>
where
    T: Connector + ?Sized,
{
    async fn connect(&self, request: ApiRequest) -> Result<ProxyResponse, ProxyError> {
        self.as_ref().connect(request).await
    }
}

/// Pluggable replacement for the upstream transport.
///
/// When an interceptor is installed on the request context, the engine asks
/// it for a connector instead of opening a connection to the backend API.
/// Interceptors synthesize responses locally, for example by replaying a
/// stored cache entry.
pub trait ConnectorInterceptor: Send + Sync {
    /// Creates the connector that will produce the synthetic response.
    fn connector(&self) -> Box<dyn Connector>;
}
