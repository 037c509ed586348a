use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::database::{DbInitError, init_db_pool};
use crate::config::{CacheConfig, CorsConfig, JwtConfig, RateLimitConfig, SessionConfig};
use crate::modules::chat::{ChatHub, PgChatStore};
use crate::modules::products::repository::{PgProductRepository, ProductRepository};
use crate::modules::sessions::{PgSessionStore, SessionStore};
use shopfront_cache::Cache;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub products: Arc<dyn ProductRepository>,
    /// `None` when caching is disabled or Redis was unreachable at startup.
    pub cache: Option<Cache>,
    pub sessions: Arc<dyn SessionStore>,
    pub chat: Arc<ChatHub>,
    pub jwt_config: JwtConfig,
    pub session_config: SessionConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cache", &self.cache)
            .field("session_config", &self.session_config.cookie_name)
            .field("rate_limit_config", &self.rate_limit_config)
            .finish_non_exhaustive()
    }
}

/// Connects the cache, logging and carrying on without one if that fails.
pub async fn connect_cache(config: &CacheConfig) -> Option<Cache> {
    match Cache::connect(config).await {
        Ok(Some(cache)) => {
            info!(cache.backend = cache.backend(), "Cache connected");
            Some(cache)
        }
        Ok(None) => {
            info!("Cache disabled");
            None
        }
        Err(e) => {
            warn!(error = %e, "Cache unavailable, continuing without it");
            None
        }
    }
}

/// Builds the state around an existing pool with the Postgres-backed stores.
pub fn build_app_state(db: PgPool, cache: Option<Cache>) -> AppState {
    AppState {
        products: Arc::new(PgProductRepository::new(db.clone())),
        sessions: Arc::new(PgSessionStore::new(db.clone())),
        chat: Arc::new(ChatHub::new(Arc::new(PgChatStore::new(db.clone())))),
        db,
        cache,
        jwt_config: JwtConfig::from_env(),
        session_config: SessionConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        rate_limit_config: RateLimitConfig::from_env(),
    }
}

pub async fn init_app_state() -> Result<AppState, DbInitError> {
    let db = init_db_pool().await?;
    let cache = connect_cache(&CacheConfig::from_env()).await;

    Ok(build_app_state(db, cache))
}
