//! # Shopfront Cache
//!
//! Key/value caching with TTL for the Shopfront API.
//!
//! This crate provides:
//! - The [`CacheStore`] trait: raw string get/set/delete/delete-by-prefix
//! - [`RedisCache`]: production store over a Redis connection manager
//! - [`MemoryCache`]: in-process store for tests and single-node setups
//! - [`Cache`]: typed JSON facade that degrades read failures to misses
//! - [`keys`]: the key namespace and invalidation helpers
//! - [`CacheConfig`]: configuration from environment variables
//!
//! Keys are built by callers; the stores are domain-agnostic.
//!
//! # Example
//!
//! ```ignore
//! use shopfront_cache::{Cache, CacheConfig};
//!
//! let config = CacheConfig::from_env();
//! let cache = Cache::connect(&config).await?;
//!
//! if let Some(cache) = &cache {
//!     cache.set("products_all", &products).await?;
//!     let cached: Option<Vec<Product>> = cache.get("products_all").await;
//! }
//! ```

pub mod cache;
pub mod config;
pub mod keys;
pub mod memory;
pub mod redis;
pub mod store;

pub use cache::Cache;
pub use config::{CacheBackend, CacheConfig};
pub use keys::invalidate;
pub use memory::MemoryCache;
pub use redis::RedisCache;
pub use store::{CacheError, CacheStore};
