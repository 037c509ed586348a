//! Cache key namespace and invalidation helpers.
//!
//! Product listings live under `products_all`; searches under
//! `search:<name>:<page>:<limit>`. Prefix invalidation of `search:` relies on
//! this exact layout.

use tracing::warn;

use crate::Cache;

/// Cache keys for product queries.
pub mod products {
    /// Key for the full product listing.
    pub const ALL: &str = "products_all";

    /// Prefix shared by every search result key.
    pub const SEARCH_PREFIX: &str = "search:";

    /// Key for one page of a name search.
    pub fn search(name: &str, page: i64, limit: i64) -> String {
        format!("{}{}:{}:{}", SEARCH_PREFIX, name, page, limit)
    }
}

/// Cache invalidation helpers for write paths.
pub mod invalidate {
    use super::*;

    /// Invalidate every cached product listing and search.
    ///
    /// Call this after creating, updating, deleting or importing products.
    /// Failures are logged; the entries then expire through their TTL.
    pub async fn products(cache: Option<&Cache>) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache.delete(products::ALL).await {
            warn!(error = %e, "Failed to invalidate product list cache");
        }

        if let Err(e) = cache.delete_by_prefix(products::SEARCH_PREFIX).await {
            warn!(error = %e, "Failed to invalidate product search caches");
        }
    }
}
