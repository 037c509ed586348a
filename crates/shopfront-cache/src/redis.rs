//! Redis-backed cache store.

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, instrument};

use crate::config::MAX_TTL_SECONDS;
use crate::store::{CacheError, CacheStore};

/// Keys scanned per SCAN round trip during prefix deletion.
const SCAN_BATCH: usize = 100;

/// Redis cache client with connection pooling.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Connects to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if the URL is invalid or the server
    /// cannot be reached.
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn })
    }
}

/// Escapes glob metacharacters so a literal prefix can be used with `SCAN MATCH`.
pub fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl CacheStore for RedisCache {
    fn backend(&self) -> &'static str {
        "redis"
    }

    #[instrument(skip(self), fields(cache.operation = "GET"))]
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value = conn.get::<_, Option<String>>(key).await?;
        Ok(value)
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().clamp(1, MAX_TTL_SECONDS))
            .await?;

        debug!(cache.key = %key, cache.ttl_secs = %ttl.as_secs(), "Cache set");

        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(key).await?;

        debug!(cache.key = %key, "Cache key deleted");

        Ok(())
    }

    /// Lists every matching key with `SCAN`, then removes them with a single `DEL`.
    ///
    /// `SCAN` does not block the server the way `KEYS` does, but keys written
    /// while the scan is in progress may be missed.
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", escape_glob(prefix));
        let mut cursor: u64 = 0;
        let mut keys: Vec<String> = Vec::new();

        loop {
            let (next_cursor, page): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            keys.extend(page);

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        // SCAN may return a key more than once.
        keys.sort_unstable();
        keys.dedup();

        let deleted: u64 = if keys.is_empty() {
            0
        } else {
            conn.del(&keys).await?
        };

        debug!(cache.prefix = %prefix, cache.deleted = %deleted, "Prefix invalidation complete");

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_glob_plain_prefix_unchanged() {
        assert_eq!(escape_glob("search:"), "search:");
    }

    #[test]
    fn test_escape_glob_metacharacters() {
        assert_eq!(escape_glob("search:a*b?"), r"search:a\*b\?");
        assert_eq!(escape_glob("x[1]"), r"x\[1\]");
    }

    // Integration tests require a running Redis instance.

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_set_get_and_prefix_delete() {
        let cache = RedisCache::new("redis://localhost:6379").await.unwrap();

        cache
            .set_raw("search:test:1:10", "[]".into(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set_raw("products_all", "[]".into(), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.delete_by_prefix("search:").await.unwrap() >= 1);
        assert_eq!(cache.get_raw("search:test:1:10").await.unwrap(), None);
        assert_eq!(
            cache.get_raw("products_all").await.unwrap(),
            Some("[]".to_string())
        );

        cache.delete("products_all").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_prefix_delete_spans_scan_pages() {
        let cache = RedisCache::new("redis://localhost:6379").await.unwrap();
        let prefix = "search:bulk-prefix-test:";

        for i in 0..(SCAN_BATCH * 3 + 7) {
            cache
                .set_raw(&format!("{prefix}{i}:1:10"), "[]".into(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        let deleted = cache.delete_by_prefix(prefix).await.unwrap();
        assert_eq!(deleted, (SCAN_BATCH * 3 + 7) as u64);
        assert_eq!(cache.delete_by_prefix(prefix).await.unwrap(), 0);
    }
}
