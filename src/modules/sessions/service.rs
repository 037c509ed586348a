use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sqlx::PgPool;
use tracing::{info, instrument};

use shopfront_config::SessionConfig;
use shopfront_core::AppError;

use crate::metrics;
use crate::modules::auth::service::AuthService;

use super::model::{SessionData, SessionUser};
use super::store::SessionStore;

/// Random bytes per session id, before encoding.
const SESSION_ID_BYTES: usize = 24;

pub struct SessionService;

impl SessionService {
    /// Generates an unguessable, cookie-safe session id.
    pub fn new_session_id() -> String {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Checks credentials and opens a session for the user.
    ///
    /// Returns the new (unsigned) session id and the user it belongs to.
    #[instrument(skip(db, store, config, password), fields(db.operation = "INSERT", db.table = "sessions"))]
    pub async fn login(
        db: &PgPool,
        store: &dyn SessionStore,
        config: &SessionConfig,
        username: &str,
        password: &str,
    ) -> Result<(String, SessionUser), AppError> {
        let user = AuthService::verify_credentials(db, username, password).await?;

        let session_id = Self::new_session_id();
        let data = SessionData::for_user(user.id, &user.username);
        let ttl = Duration::from_secs(config.max_age_secs.max(0) as u64);

        store.save(&session_id, &data, ttl).await?;

        metrics::track_user_login_success(&user.role);
        info!(user.id = %user.id, "Session opened");

        Ok((
            session_id,
            SessionUser {
                id: user.id,
                username: user.username,
            },
        ))
    }

    #[instrument(skip(store), fields(db.operation = "DELETE", db.table = "sessions"))]
    pub async fn logout(store: &dyn SessionStore, session_id: &str) -> Result<(), AppError> {
        store.destroy(session_id).await?;
        Ok(())
    }

    /// The user behind a session, if the session exists and is logged in.
    #[instrument(skip(store), fields(db.operation = "SELECT", db.table = "sessions"))]
    pub async fn current_user(
        store: &dyn SessionStore,
        session_id: &str,
    ) -> Result<Option<SessionUser>, AppError> {
        Ok(store.load(session_id).await?.and_then(|data| data.user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::sessions::store::MemorySessionStore;
    use uuid::Uuid;

    #[test]
    fn test_session_ids_are_unique_and_cookie_safe() {
        let first = SessionService::new_session_id();
        let second = SessionService::new_session_id();

        assert_ne!(first, second);
        assert_eq!(first.len(), 32);
        assert!(
            first
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[tokio::test]
    async fn test_current_user_and_logout() {
        let store = MemorySessionStore::new();
        let id = Uuid::new_v4();
        store
            .save("sid", &SessionData::for_user(id, "alice"), Duration::from_secs(60))
            .await
            .unwrap();

        let user = SessionService::current_user(&store, "sid").await.unwrap();
        assert_eq!(user.map(|u| u.id), Some(id));

        SessionService::logout(&store, "sid").await.unwrap();
        assert!(
            SessionService::current_user(&store, "sid")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        let store = MemorySessionStore::new();
        store.set_unavailable(true);

        let err = SessionService::current_user(&store, "sid").await.unwrap_err();
        assert_eq!(err.status.as_u16(), 500);
    }
}
