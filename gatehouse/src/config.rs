//! Caching policy configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration for one caching policy binding.
///
/// ```json
/// { "ttl": 60, "includeQueryInKey": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CachingConfig {
    /// Entry time-to-live in seconds. `0` disables caching for this binding.
    pub ttl: u64,
    /// Whether the raw query string participates in the cache key.
    pub include_query_in_key: bool,
}

impl Default for CachingConfig {
    fn default() -> Self {
        CachingConfig {
            ttl: 0,
            include_query_in_key: false,
        }
    }
}

impl CachingConfig {
    /// Parses the JSON configuration of a policy binding.
    ///
    /// Unknown keys are ignored; a malformed document degrades to the
    /// disabled configuration instead of failing the binding.
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Parses a flat string-options map.
    ///
    /// Unknown keys are ignored. A `ttl` that does not parse as a
    /// non-negative integer disables caching. `includeQueryInKey` accepts
    /// `true`/`false` case-insensitively; any other value means false.
    pub fn from_options(options: &HashMap<String, String>) -> Self {
        let ttl = options
            .get("ttl")
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(0);
        let include_query_in_key = options
            .get("includeQueryInKey")
            .is_some_and(|raw| raw.eq_ignore_ascii_case("true"));
        CachingConfig {
            ttl,
            include_query_in_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn json_parses_the_documented_schema() {
        let config = CachingConfig::from_json(r#"{ "ttl": 2, "includeQueryInKey": true }"#);
        assert_eq!(config.ttl, 2);
        assert!(config.include_query_in_key);
    }

    #[test]
    fn json_fields_default_when_absent() {
        let config = CachingConfig::from_json(r#"{ "ttl": 60 }"#);
        assert_eq!(config.ttl, 60);
        assert!(!config.include_query_in_key);

        assert_eq!(CachingConfig::from_json("{}"), CachingConfig::default());
    }

    #[test]
    fn json_unknown_keys_are_ignored() {
        let config = CachingConfig::from_json(r#"{ "ttl": 5, "staleWhileRevalidate": 30 }"#);
        assert_eq!(config.ttl, 5);
    }

    #[test]
    fn malformed_json_degrades_to_disabled() {
        assert_eq!(CachingConfig::from_json("not json"), CachingConfig::default());
        assert_eq!(
            CachingConfig::from_json(r#"{ "ttl": "soon" }"#),
            CachingConfig::default()
        );
    }

    #[test]
    fn options_ttl_degrades_to_zero_when_unparseable() {
        assert_eq!(CachingConfig::from_options(&options(&[("ttl", "90")])).ttl, 90);
        assert_eq!(CachingConfig::from_options(&options(&[("ttl", "-1")])).ttl, 0);
        assert_eq!(CachingConfig::from_options(&options(&[("ttl", "abc")])).ttl, 0);
        assert_eq!(CachingConfig::from_options(&options(&[])).ttl, 0);
    }

    #[test]
    fn options_include_query_matches_true_case_insensitively() {
        let truthy = CachingConfig::from_options(&options(&[("includeQueryInKey", "TRUE")]));
        assert!(truthy.include_query_in_key);

        let falsy = CachingConfig::from_options(&options(&[("includeQueryInKey", "yes")]));
        assert!(!falsy.include_query_in_key);

        let absent = CachingConfig::from_options(&options(&[]));
        assert!(!absent.include_query_in_key);
    }

    #[test]
    fn options_unknown_keys_are_ignored() {
        let config =
            CachingConfig::from_options(&options(&[("ttl", "5"), ("maxEntries", "100")]));
        assert_eq!(config.ttl, 5);
    }
}
