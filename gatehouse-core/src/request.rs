//! The inbound request fingerprint.
//!
//! Policies see a read-only snapshot of the proxied call: the API identity
//! it was routed under, the HTTP verb, the destination path, the raw query
//! string, and the request headers. Header storage is `http::HeaderMap`,
//! which is case insensitive and preserves insertion order.

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};

/// API identity under which a request is proxied.
///
/// A request carries either the API key bound to a client contract, or the
/// managed API coordinates when no contract exists. The two forms are
/// mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiIdentity {
    /// A client contract bound to an API key.
    Contract {
        /// The bound API key.
        api_key: String,
    },
    /// Managed API coordinates.
    Coordinates {
        /// Organization that owns the API.
        org_id: String,
        /// API identifier within the organization.
        api_id: String,
        /// Published API version.
        version: String,
    },
}

/// Read-only snapshot of an inbound request as seen by policies.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    identity: ApiIdentity,
    method: Method,
    destination: String,
    query: Option<String>,
    headers: HeaderMap,
}

impl ApiRequest {
    /// Starts building a request for the given identity.
    pub fn builder(identity: ApiIdentity) -> ApiRequestBuilder {
        ApiRequestBuilder {
            identity,
            method: Method::GET,
            destination: String::new(),
            query: None,
            headers: HeaderMap::new(),
        }
    }

    /// The identity this request was routed under.
    pub fn identity(&self) -> &ApiIdentity {
        &self.identity
    }

    /// The HTTP verb.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The destination path. May be empty.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The raw query string, exactly as received.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header_str(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Builder for [`ApiRequest`].
#[derive(Debug)]
pub struct ApiRequestBuilder {
    identity: ApiIdentity,
    method: Method,
    destination: String,
    query: Option<String>,
    headers: HeaderMap,
}

impl ApiRequestBuilder {
    /// Sets the HTTP verb. Defaults to `GET`.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the destination path.
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Sets the raw query string.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Appends a request header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Finishes the snapshot.
    pub fn build(self) -> ApiRequest {
        ApiRequest {
            identity: self.identity,
            method: self.method,
            destination: self.destination,
            query: self.query,
            headers: self.headers,
        }
    }
}
