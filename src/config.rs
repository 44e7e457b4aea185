//! Configuration Module
//!
//! Handles loading cache sizing and expiry parameters from environment variables.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_CAPACITY: usize = 1000;
const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_PREFIX: &str = "LRUTTL";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults,
/// or deserialized as part of a larger application config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Cache-wide TTL in seconds, 0 = entries never expire by the global rule
    pub global_ttl_secs: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LRUTTL_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `LRUTTL_TTL_SECS` - Global TTL in seconds (default: 300)
    pub fn from_env() -> Self {
        Self::from_env_prefixed(DEFAULT_PREFIX)
    }

    /// Same as [`from_env`](Self::from_env) but reads `{prefix}_CAPACITY` and
    /// `{prefix}_TTL_SECS`, so each cache in a process can be tuned separately.
    pub fn from_env_prefixed(prefix: &str) -> Self {
        Self {
            capacity: env::var(format!("{prefix}_CAPACITY"))
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_CAPACITY),
            global_ttl_secs: env::var(format!("{prefix}_TTL_SECS"))
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_TTL_SECS),
        }
    }

    /// Global TTL as a duration. Zero disables the global rule.
    pub fn global_ttl(&self) -> Duration {
        Duration::from_secs(self.global_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            global_ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.global_ttl_secs, 300);
        assert_eq!(config.global_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Prefix unique to this test so parallel tests don't interfere
        env::remove_var("CFG_DEFAULTS_CAPACITY");
        env::remove_var("CFG_DEFAULTS_TTL_SECS");

        let config = CacheConfig::from_env_prefixed("CFG_DEFAULTS");
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_config_from_env_prefixed() {
        env::set_var("CFG_DNS_CAPACITY", "64");
        env::set_var("CFG_DNS_TTL_SECS", " 0 ");

        let config = CacheConfig::from_env_prefixed("CFG_DNS");
        assert_eq!(config.capacity, 64);
        assert_eq!(config.global_ttl(), Duration::ZERO);

        env::remove_var("CFG_DNS_CAPACITY");
        env::remove_var("CFG_DNS_TTL_SECS");
    }

    #[test]
    fn test_config_from_env_unparsable_falls_back() {
        env::set_var("CFG_BAD_CAPACITY", "lots");

        let config = CacheConfig::from_env_prefixed("CFG_BAD");
        assert_eq!(config.capacity, 1000);

        env::remove_var("CFG_BAD_CAPACITY");
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: CacheConfig = serde_json::from_str(r#"{"capacity": 10}"#).unwrap();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.global_ttl_secs, 300);
    }
}
