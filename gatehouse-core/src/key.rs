//! Cache key construction.
//!
//! A cache key is an opaque printable string identifying a stored response.
//! Components are joined with a single `:` separator:
//!
//! ```text
//! <identity>:<verb>:<destination>[?query][:<content-type-suffix>]
//! ```
//!
//! The identity is the contract API key when one exists, otherwise
//! `orgId:apiId:version`. The optional content-type suffix is the base64
//! encoding of the lowercased `type/subtype` bytes, appended once the
//! response content type is known.
//!
//! ```
//! use gatehouse_core::{ApiIdentity, ApiRequest, CacheKey};
//!
//! let request = ApiRequest::builder(ApiIdentity::Coordinates {
//!     org_id: "acme".into(),
//!     api_id: "orders".into(),
//!     version: "1.0".into(),
//! })
//! .destination("/orders/42")
//! .build();
//!
//! let key = CacheKey::from_request(&request, false);
//! assert_eq!(key.as_str(), "acme:orders:1.0:GET:/orders/42");
//! ```
//!
//! Keys compare bytewise on their rendered form; there is no collision
//! handling beyond key equality. Cloning is O(1): the rendered string is
//! shared behind an [`Arc`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::request::{ApiIdentity, ApiRequest};

const KEY_SEPARATOR: char = ':';

/// A byte-stable cache key identifying a stored response.
#[derive(Debug, Clone)]
pub struct CacheKey {
    inner: Arc<str>,
}

impl CacheKey {
    /// Derives the lookup key for a request.
    ///
    /// The identity fields, verb, and destination are rendered verbatim; no
    /// URL decoding or normalization is applied, and an empty destination is
    /// retained. When `include_query` is set and the request carries a
    /// non-empty raw query string, it is appended after a `?`.
    pub fn from_request(request: &ApiRequest, include_query: bool) -> Self {
        let mut rendered = String::new();
        match request.identity() {
            ApiIdentity::Contract { api_key } => rendered.push_str(api_key),
            ApiIdentity::Coordinates {
                org_id,
                api_id,
                version,
            } => {
                rendered.push_str(org_id);
                rendered.push(KEY_SEPARATOR);
                rendered.push_str(api_id);
                rendered.push(KEY_SEPARATOR);
                rendered.push_str(version);
            }
        }
        rendered.push(KEY_SEPARATOR);
        rendered.push_str(request.method().as_str());
        rendered.push(KEY_SEPARATOR);
        rendered.push_str(request.destination());
        if include_query {
            if let Some(query) = request.query() {
                if !query.is_empty() {
                    rendered.push('?');
                    rendered.push_str(query);
                }
            }
        }
        CacheKey {
            inner: rendered.into(),
        }
    }

    /// Returns this key qualified by a response content type.
    ///
    /// Media type names are case insensitive, so the content type is
    /// ASCII-lowercased before encoding; non-ASCII bytes pass through
    /// unchanged. Base64 (standard alphabet, padded) keeps the suffix
    /// printable and free of the key separator.
    pub fn with_content_type(&self, content_type: &str) -> Self {
        let suffix = STANDARD.encode(content_type.to_ascii_lowercase());
        let mut rendered = String::with_capacity(self.inner.len() + 1 + suffix.len());
        rendered.push_str(&self.inner);
        rendered.push(KEY_SEPARATOR);
        rendered.push_str(&suffix);
        CacheKey {
            inner: rendered.into(),
        }
    }

    /// The rendered key.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl From<&str> for CacheKey {
    fn from(rendered: &str) -> Self {
        CacheKey {
            inner: Arc::from(rendered),
        }
    }
}

impl From<String> for CacheKey {
    fn from(rendered: String) -> Self {
        CacheKey {
            inner: rendered.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use http::header::{ACCEPT, HeaderValue};

    use super::*;

    fn coordinates() -> ApiIdentity {
        ApiIdentity::Coordinates {
            org_id: "acme".into(),
            api_id: "orders".into(),
            version: "1.0".into(),
        }
    }

    #[test]
    fn contract_identity_uses_the_api_key() {
        let request = ApiRequest::builder(ApiIdentity::Contract {
            api_key: "abc-123".into(),
        })
        .method(Method::POST)
        .destination("/orders")
        .build();

        assert_eq!(
            CacheKey::from_request(&request, false).as_str(),
            "abc-123:POST:/orders"
        );
    }

    #[test]
    fn coordinates_identity_joins_org_api_and_version() {
        let request = ApiRequest::builder(coordinates())
            .destination("/orders/42")
            .build();

        assert_eq!(
            CacheKey::from_request(&request, false).as_str(),
            "acme:orders:1.0:GET:/orders/42"
        );
    }

    #[test]
    fn query_is_appended_verbatim_only_when_requested() {
        let request = ApiRequest::builder(coordinates())
            .destination("/orders")
            .query("foo=b%20ar&x=1")
            .build();

        assert_eq!(
            CacheKey::from_request(&request, true).as_str(),
            "acme:orders:1.0:GET:/orders?foo=b%20ar&x=1"
        );
        assert_eq!(
            CacheKey::from_request(&request, false).as_str(),
            "acme:orders:1.0:GET:/orders"
        );
    }

    #[test]
    fn empty_query_is_omitted() {
        let request = ApiRequest::builder(coordinates())
            .destination("/orders")
            .query("")
            .build();

        assert_eq!(
            CacheKey::from_request(&request, true).as_str(),
            "acme:orders:1.0:GET:/orders"
        );
    }

    #[test]
    fn empty_destination_is_retained() {
        let request = ApiRequest::builder(coordinates()).build();
        assert_eq!(
            CacheKey::from_request(&request, false).as_str(),
            "acme:orders:1.0:GET:"
        );
    }

    #[test]
    fn key_derivation_is_deterministic() {
        let request = ApiRequest::builder(coordinates())
            .destination("/orders")
            .query("a=1")
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .build();

        let first = CacheKey::from_request(&request, true);
        let second = CacheKey::from_request(&request.clone(), true);
        assert_eq!(first, second);
        assert_eq!(first.as_str(), second.as_str());
    }

    #[test]
    fn content_type_suffix_is_base64_of_the_lowercased_type() {
        let key = CacheKey::from("k");
        // base64("application/json") with standard padding
        assert_eq!(
            key.with_content_type("application/json").as_str(),
            "k:YXBwbGljYXRpb24vanNvbg=="
        );
        // lowercasing happens before encoding
        assert_eq!(
            key.with_content_type("Application/JSON"),
            key.with_content_type("application/json")
        );
    }

    #[test]
    fn content_type_lowercasing_is_ascii_only() {
        let key = CacheKey::from("k");
        assert_eq!(
            key.with_content_type("TEXT/ü"),
            key.with_content_type("text/ü")
        );
        assert_ne!(
            key.with_content_type("text/ü"),
            key.with_content_type("text/Ü")
        );
    }

    #[test]
    fn keys_compare_bytewise() {
        assert_eq!(CacheKey::from("a:b"), CacheKey::from("a:b".to_owned()));
        assert_ne!(CacheKey::from("a:b"), CacheKey::from("a:B"));
    }
}
