//! The policy trait applied along the request/response pipeline.

use async_trait::async_trait;

use crate::context::PolicyContext;
use crate::error::PolicyError;
use crate::io::BodyStream;
use crate::request::ApiRequest;
use crate::response::ResponseHead;

/// A two-phase policy in the gateway chain.
///
/// The chain calls [`on_request`](Policy::on_request) on the way to the
/// backend API and [`on_response`](Policy::on_response) on the way back.
/// Returning `Ok` resumes the chain with the (possibly modified) message;
/// returning `Err` aborts the proxied call. For one request, the two phases
/// and all body-handler events run strictly in sequence; state a policy
/// keeps in the [`PolicyContext`] needs no synchronization.
///
/// Body handlers wrap the corresponding byte streams; the default handlers
/// pass the stream through untouched.
#[async_trait]
pub trait Policy: Send + Sync {
    /// Applies the policy to an inbound request.
    async fn on_request(
        &self,
        request: ApiRequest,
        ctx: &mut PolicyContext,
    ) -> Result<ApiRequest, PolicyError>;

    /// Applies the policy to the response head.
    async fn on_response(
        &self,
        head: ResponseHead,
        ctx: &mut PolicyContext,
    ) -> Result<ResponseHead, PolicyError>;

    /// Wraps the request body stream.
    fn request_body_handler(
        &self,
        _request: &ApiRequest,
        _ctx: &mut PolicyContext,
        body: BodyStream,
    ) -> BodyStream {
        body
    }

    /// Wraps the response body stream.
    ///
    /// `head` is the response head as returned by
    /// [`on_response`](Policy::on_response) for this request.
    fn response_body_handler(
        &self,
        _head: &ResponseHead,
        _ctx: &mut PolicyContext,
        body: BodyStream,
    ) -> BodyStream {
        body
    }
}
