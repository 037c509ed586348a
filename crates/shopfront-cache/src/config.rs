//! Cache configuration.
//!
//! This module provides configuration for the cache backend loaded from
//! environment variables.

use std::env;
use std::time::Duration;

/// Upper bound on any cache TTL: 30 days.
pub const MAX_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Which store backs the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
    /// No cache; every read goes to the database.
    Disabled,
}

impl CacheBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "redis" => Some(Self::Redis),
            "memory" => Some(Self::Memory),
            "none" | "disabled" | "off" => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Cache configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_TTL_SECONDS`: Default TTL for cached items in seconds (default: `3600`,
///   capped at [`MAX_TTL_SECONDS`])
/// - `CACHE_BACKEND`: `redis`, `memory` or `none` (default: `redis`)
/// - `CACHE_ENABLED`: `false` forces the backend to `none`
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Redis connection URL.
    pub redis_url: String,

    /// Default time-to-live for cached items in seconds.
    pub default_ttl_seconds: u64,

    pub backend: CacheBackend,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enabled = env::var("CACHE_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);

        let backend = if enabled {
            env::var("CACHE_BACKEND")
                .ok()
                .and_then(|v| CacheBackend::parse(&v))
                .unwrap_or(defaults.backend)
        } else {
            CacheBackend::Disabled
        };

        Self {
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            default_ttl_seconds: parse_ttl(env::var("CACHE_TTL_SECONDS").ok().as_deref())
                .unwrap_or(defaults.default_ttl_seconds),
            backend,
        }
    }

    /// An in-memory configuration for tests.
    pub fn memory() -> Self {
        Self {
            backend: CacheBackend::Memory,
            ..Self::default()
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds.min(MAX_TTL_SECONDS))
    }
}

/// Parses a positive TTL in seconds, capped at [`MAX_TTL_SECONDS`].
fn parse_ttl(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .map(|v| v.min(MAX_TTL_SECONDS))
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".into(),
            default_ttl_seconds: 3600,
            backend: CacheBackend::Redis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl(), Duration::from_secs(3600));
        assert_eq!(config.backend, CacheBackend::Redis);
    }

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl(Some("120")), Some(120));
        assert_eq!(parse_ttl(Some("0")), None);
        assert_eq!(parse_ttl(Some("soon")), None);
        assert_eq!(parse_ttl(None), None);
        assert_eq!(parse_ttl(Some("18446744073709551615")), Some(MAX_TTL_SECONDS));
    }

    #[test]
    fn test_default_ttl_is_capped() {
        let config = CacheConfig {
            default_ttl_seconds: u64::MAX,
            ..CacheConfig::default()
        };
        assert_eq!(config.default_ttl(), Duration::from_secs(MAX_TTL_SECONDS));
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!(CacheBackend::parse("Redis"), Some(CacheBackend::Redis));
        assert_eq!(CacheBackend::parse(" memory "), Some(CacheBackend::Memory));
        assert_eq!(CacheBackend::parse("none"), Some(CacheBackend::Disabled));
        assert_eq!(CacheBackend::parse("memcached"), None);
    }
}
