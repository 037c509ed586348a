//! Resolves the identity behind a websocket handshake from its session cookie.
//!
//! Absent, unsigned or unknown sessions connect anonymously. A forged
//! signature is rejected, and so is a session store failure: the first is a
//! client problem, the second an infrastructure one, and neither should be
//! silently downgraded.

use cookie::Cookie;
use tracing::{debug, warn};
use uuid::Uuid;

use shopfront_auth::{SignatureError, unsign_session_id};
use shopfront_config::SessionConfig;
use shopfront_core::AppError;

use super::store::{SessionStore, SessionStoreError};

/// Display name for connections without an authenticated session.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Who is on the other end of a socket. Fixed for the connection's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketIdentity {
    User { id: Uuid, username: String },
    Anonymous,
}

impl SocketIdentity {
    pub fn display_name(&self) -> &str {
        match self {
            Self::User { username, .. } => username,
            Self::Anonymous => ANONYMOUS_NAME,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Invalid session signature")]
    InvalidSignature,

    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

impl BridgeError {
    pub fn into_app_error(self) -> AppError {
        match self {
            Self::InvalidSignature => AppError::unauthorized("Invalid session".to_string()),
            Self::Store(e) => AppError::internal(e),
        }
    }
}

/// Finds the first cookie called `name` in a `Cookie` header value.
///
/// Malformed pairs are skipped. The returned value is percent-decoded.
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse_encoded(header)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

/// Maps a raw `Cookie` header to a socket identity.
///
/// # Errors
///
/// - [`BridgeError::InvalidSignature`] if a signed session cookie fails verification
/// - [`BridgeError::Store`] if the session store cannot be queried
pub async fn resolve_socket_identity(
    cookie_header: Option<&str>,
    config: &SessionConfig,
    store: &dyn SessionStore,
) -> Result<SocketIdentity, BridgeError> {
    let Some(raw) = cookie_header.and_then(|h| find_cookie(h, &config.cookie_name)) else {
        return Ok(SocketIdentity::Anonymous);
    };

    let session_id = match unsign_session_id(&raw, &config.secret) {
        Ok(id) => id,
        Err(SignatureError::NotSigned) => {
            debug!("Unsigned session cookie, connecting anonymously");
            return Ok(SocketIdentity::Anonymous);
        }
        Err(SignatureError::Mismatch) => {
            warn!("Session cookie signature mismatch");
            return Err(BridgeError::InvalidSignature);
        }
    };

    let Some(session) = store.load(&session_id).await? else {
        debug!("No session record, connecting anonymously");
        return Ok(SocketIdentity::Anonymous);
    };

    Ok(match session.user {
        Some(user) => SocketIdentity::User {
            id: user.id,
            username: user.username,
        },
        None => SocketIdentity::Anonymous,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::modules::sessions::model::SessionData;
    use crate::modules::sessions::store::MemorySessionStore;
    use shopfront_auth::sign_session_id;

    fn config() -> SessionConfig {
        SessionConfig {
            secret: "keyboard cat".into(),
            ..SessionConfig::default()
        }
    }

    async fn store_with_alice() -> MemorySessionStore {
        let store = MemorySessionStore::new();
        store
            .save(
                "sid-alice",
                &SessionData::for_user(Uuid::new_v4(), "alice"),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        store
    }

    fn header_for(session_id: &str, secret: &str) -> String {
        format!(
            "theme=dark; connect.sid={}",
            sign_session_id(session_id, secret)
        )
    }

    #[tokio::test]
    async fn test_no_cookie_header_is_anonymous() {
        let store = MemorySessionStore::new();
        let identity = resolve_socket_identity(None, &config(), &store)
            .await
            .unwrap();
        assert_eq!(identity, SocketIdentity::Anonymous);
        assert_eq!(identity.display_name(), "Anonymous");
    }

    #[tokio::test]
    async fn test_other_cookies_only_is_anonymous() {
        let store = MemorySessionStore::new();
        let identity = resolve_socket_identity(Some("theme=dark; lang=en"), &config(), &store)
            .await
            .unwrap();
        assert_eq!(identity, SocketIdentity::Anonymous);
    }

    #[tokio::test]
    async fn test_valid_signed_cookie_resolves_user() {
        let store = store_with_alice().await;
        let header = header_for("sid-alice", "keyboard cat");

        let identity = resolve_socket_identity(Some(&header), &config(), &store)
            .await
            .unwrap();

        assert!(identity.is_authenticated());
        assert_eq!(identity.display_name(), "alice");
    }

    #[tokio::test]
    async fn test_percent_encoded_cookie_resolves_user() {
        let store = store_with_alice().await;
        let signed = sign_session_id("sid-alice", "keyboard cat")
            .replace(':', "%3A")
            .replace('+', "%2B")
            .replace('/', "%2F");
        let header = format!("connect.sid={signed}");

        let identity = resolve_socket_identity(Some(&header), &config(), &store)
            .await
            .unwrap();
        assert_eq!(identity.display_name(), "alice");
    }

    #[tokio::test]
    async fn test_bad_signature_is_rejected() {
        let store = store_with_alice().await;
        let header = header_for("sid-alice", "some other secret");

        let err = resolve_socket_identity(Some(&header), &config(), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidSignature));
        assert_eq!(err.into_app_error().status.as_u16(), 401);
    }

    #[tokio::test]
    async fn test_unsigned_cookie_is_anonymous() {
        let store = store_with_alice().await;
        let identity =
            resolve_socket_identity(Some("connect.sid=sid-alice"), &config(), &store)
                .await
                .unwrap();
        assert_eq!(identity, SocketIdentity::Anonymous);
    }

    #[tokio::test]
    async fn test_unknown_session_is_anonymous() {
        let store = MemorySessionStore::new();
        let header = header_for("sid-missing", "keyboard cat");

        let identity = resolve_socket_identity(Some(&header), &config(), &store)
            .await
            .unwrap();
        assert_eq!(identity, SocketIdentity::Anonymous);
    }

    #[tokio::test]
    async fn test_session_without_user_is_anonymous() {
        let store = MemorySessionStore::new();
        store
            .save("sid-empty", &SessionData::default(), Duration::from_secs(60))
            .await
            .unwrap();
        let header = header_for("sid-empty", "keyboard cat");

        let identity = resolve_socket_identity(Some(&header), &config(), &store)
            .await
            .unwrap();
        assert_eq!(identity, SocketIdentity::Anonymous);
    }

    #[tokio::test]
    async fn test_store_failure_is_rejected() {
        let store = store_with_alice().await;
        store.set_unavailable(true);
        let header = header_for("sid-alice", "keyboard cat");

        let err = resolve_socket_identity(Some(&header), &config(), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Store(_)));
        assert_eq!(err.into_app_error().status.as_u16(), 500);
    }

    #[test]
    fn test_find_cookie_takes_first_match() {
        assert_eq!(
            find_cookie("a=1; connect.sid=first; connect.sid=second", "connect.sid").as_deref(),
            Some("first")
        );
        assert_eq!(find_cookie("a=1", "connect.sid"), None);
    }
}
