//! Typed JSON facade over a [`CacheStore`].
//!
//! Reads never fail: a backend error or an undecodable value is logged and
//! reported as a miss, so a cache outage degrades to always-miss.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument};

use crate::config::{CacheBackend, CacheConfig};
use crate::memory::MemoryCache;
use crate::redis::RedisCache;
use crate::store::{CacheError, CacheStore};

/// Shared cache handle. Cloning is cheap.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.store.backend())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    /// Builds an in-memory cache with the given default TTL.
    pub fn in_memory(default_ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCache::new()), default_ttl)
    }

    /// Connects the configured backend.
    ///
    /// Returns `Ok(None)` when caching is disabled.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if Redis cannot be reached.
    pub async fn connect(config: &CacheConfig) -> Result<Option<Self>, CacheError> {
        let store: Arc<dyn CacheStore> = match config.backend {
            CacheBackend::Disabled => {
                info!("Caching disabled");
                return Ok(None);
            }
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::Redis => Arc::new(RedisCache::new(&config.redis_url).await?),
        };

        info!(
            cache.backend = store.backend(),
            cache.ttl_secs = config.default_ttl_seconds,
            "Cache connected"
        );

        Ok(Some(Self::new(store, config.default_ttl())))
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Gets a cached value by key.
    ///
    /// Returns `None` on a miss, a backend failure, or a value that does not
    /// deserialize as `T`.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let value = match self.store.get_raw(key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(cache.key = %key, "Cache miss");
                record_lookup("miss");
                return None;
            }
            Err(e) => {
                error!(cache.key = %key, cache.backend = self.backend(), error = %e, "Cache GET error");
                record_lookup("error");
                return None;
            }
        };

        match serde_json::from_str(&value) {
            Ok(parsed) => {
                debug!(cache.key = %key, "Cache hit");
                record_lookup("hit");
                Some(parsed)
            }
            Err(e) => {
                error!(cache.key = %key, error = %e, "Failed to deserialize cached value");
                record_lookup("error");
                None
            }
        }
    }

    /// Sets a cached value with the default TTL.
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Sets a cached value with a custom TTL, replacing any existing entry.
    #[instrument(skip(self, value), fields(cache.operation = "SET"))]
    pub async fn set_with_ttl<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;
        self.store.set_raw(key, json, ttl).await
    }

    /// Removes a single key. Missing keys are not an error.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await
    }

    /// Removes every key that starts with `prefix`.
    pub async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        self.store.delete_by_prefix(prefix).await
    }
}

fn record_lookup(result: &'static str) {
    metrics::counter!("cache_lookups_total", "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
        price: f64,
    }

    /// A store whose every call fails, standing in for an unreachable backend.
    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        fn backend(&self) -> &'static str {
            "broken"
        }

        async fn get_raw(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn set_raw(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn delete_by_prefix(&self, _prefix: &str) -> Result<u64, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_set_and_get_typed_value() {
        let cache = Cache::in_memory(Duration::from_secs(60));
        let items = vec![Item {
            name: "Widget".into(),
            price: 10.0,
        }];

        cache.set("products_all", &items).await.unwrap();
        let cached: Option<Vec<Item>> = cache.get("products_all").await;

        assert_eq!(cached, Some(items));
    }

    #[tokio::test]
    async fn test_get_with_wrong_shape_is_miss() {
        let cache = Cache::in_memory(Duration::from_secs(60));
        cache.set("k", &"just a string").await.unwrap();

        let cached: Option<Vec<Item>> = cache.get("k").await;
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_miss() {
        let cache = Cache::new(Arc::new(BrokenStore), Duration::from_secs(60));

        let cached: Option<Vec<Item>> = cache.get("products_all").await;
        assert!(cached.is_none());
        assert!(cache.set("products_all", &Vec::<Item>::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_connect_disabled_returns_none() {
        let config = CacheConfig {
            backend: CacheBackend::Disabled,
            ..CacheConfig::default()
        };
        assert!(Cache::connect(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_memory() {
        let cache = Cache::connect(&CacheConfig::memory()).await.unwrap().unwrap();
        assert_eq!(cache.backend(), "memory");
        assert_eq!(cache.default_ttl(), Duration::from_secs(3600));
    }
}
