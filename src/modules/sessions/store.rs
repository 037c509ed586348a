//! Server-side session storage.
//!
//! Sessions are keyed by the unsigned session id and carry an absolute
//! expiry. Loading an expired session behaves as if it did not exist.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;

use super::model::SessionData;

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads an unexpired session.
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>, SessionStoreError>;

    /// Creates or replaces a session, resetting its expiry to `ttl` from now.
    async fn save(
        &self,
        session_id: &str,
        data: &SessionData,
        ttl: Duration,
    ) -> Result<(), SessionStoreError>;

    /// Deleting an unknown session is not an error.
    async fn destroy(&self, session_id: &str) -> Result<(), SessionStoreError>;

    /// Removes expired sessions and returns how many were removed.
    async fn delete_expired(&self) -> Result<u64, SessionStoreError>;
}

fn expiry_from_now(ttl: Duration) -> DateTime<Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Session store over the `sessions` table.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    db: PgPool,
}

impl PgSessionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>, SessionStoreError> {
        let row = sqlx::query_scalar::<_, Json<SessionData>>(
            "SELECT data FROM sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|Json(data)| data))
    }

    async fn save(
        &self,
        session_id: &str,
        data: &SessionData,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        sqlx::query(
            "INSERT INTO sessions (id, data, expires_at) VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, expires_at = EXCLUDED.expires_at",
        )
        .bind(session_id)
        .bind(Json(data))
        .bind(expiry_from_now(ttl))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), SessionStoreError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, SessionStoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.db)
            .await?;

        debug!(deleted = result.rows_affected(), "Expired sessions removed");

        Ok(result.rows_affected())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemorySessionStore;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    use tokio::sync::RwLock;

    use super::*;

    /// HashMap-backed store. `set_unavailable(true)` makes every call fail.
    #[derive(Debug, Clone, Default)]
    pub struct MemorySessionStore {
        sessions: Arc<RwLock<HashMap<String, (SessionData, Instant)>>>,
        unavailable: Arc<AtomicBool>,
    }

    impl MemorySessionStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), SessionStoreError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(SessionStoreError::Unavailable("store offline".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl SessionStore for MemorySessionStore {
        async fn load(&self, session_id: &str) -> Result<Option<SessionData>, SessionStoreError> {
            self.check()?;
            let sessions = self.sessions.read().await;
            Ok(sessions
                .get(session_id)
                .filter(|(_, expires_at)| Instant::now() < *expires_at)
                .map(|(data, _)| data.clone()))
        }

        async fn save(
            &self,
            session_id: &str,
            data: &SessionData,
            ttl: Duration,
        ) -> Result<(), SessionStoreError> {
            self.check()?;
            let now = Instant::now();
            let expires_at = now
                .checked_add(ttl)
                .unwrap_or_else(|| now + Duration::from_secs(u64::from(u32::MAX)));
            self.sessions
                .write()
                .await
                .insert(session_id.to_string(), (data.clone(), expires_at));
            Ok(())
        }

        async fn destroy(&self, session_id: &str) -> Result<(), SessionStoreError> {
            self.check()?;
            self.sessions.write().await.remove(session_id);
            Ok(())
        }

        async fn delete_expired(&self) -> Result<u64, SessionStoreError> {
            self.check()?;
            let now = Instant::now();
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, (_, expires_at)| now < *expires_at);
            Ok((before - sessions.len()) as u64)
        }
    }
}
