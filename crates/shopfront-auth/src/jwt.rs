//! JWT utilities for the JSON API.
//!
//! - **Access tokens** carry the user id, username and role.
//! - **Refresh tokens** carry the user id and a unique `jti`.
//!
//! Both are HS256 tokens signed with [`JwtConfig::secret`].
//!
//! # Example
//!
//! ```ignore
//! let token = create_access_token(user_id, "alice", "user", &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.username, "alice");
//! ```

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use shopfront_config::JwtConfig;
use shopfront_core::AppError;

use crate::claims::{Claims, RefreshTokenClaims};

/// Creates a short-lived access token.
///
/// # Errors
///
/// Returns an internal error if token encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    username: &str,
    role: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let exp = (now + jwt_config.access_token_expiry).max(0) as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role: role.to_string(),
        exp,
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {}", e)))
}

/// Verifies an access token and returns the embedded claims.
///
/// # Errors
///
/// Returns an unauthorized error if the signature is invalid, the token has
/// expired, or it is malformed.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token".to_string()))
}

/// Creates a refresh token for obtaining new access tokens.
///
/// # Errors
///
/// Returns an internal error if token encoding fails.
pub fn create_refresh_token(
    user_id: Uuid,
    username: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let exp = (now + jwt_config.refresh_token_expiry).max(0) as usize;

    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp,
        iat: now as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create refresh token: {}", e)))
}

/// Verifies a refresh token and returns the claims.
///
/// # Errors
///
/// Returns an unauthorized error if the token is invalid or expired.
pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid refresh token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 25200,
        }
    }

    #[test]
    fn test_create_and_verify_access_token() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let token = create_access_token(user_id, "alice", "admin", &config).unwrap();
        assert!(!token.is_empty());

        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_verify_token_invalid() {
        let config = get_test_jwt_config();
        let err = verify_token("invalid-token", &config).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let config = get_test_jwt_config();
        let token = create_access_token(Uuid::new_v4(), "alice", "user", &config).unwrap();

        let wrong_config = JwtConfig {
            secret: "different-secret-key-at-least-32-characters".to_string(),
            ..config
        };

        assert!(verify_token(&token, &wrong_config).is_err());
    }

    #[test]
    fn test_verify_token_expired() {
        let config = JwtConfig {
            access_token_expiry: -120,
            ..get_test_jwt_config()
        };
        let token = create_access_token(Uuid::new_v4(), "alice", "user", &config).unwrap();

        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let token = create_refresh_token(user_id, "bob", &config).unwrap();
        let claims = verify_refresh_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "bob");
        assert_eq!(claims.exp - claims.iat, 25200);
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let first = create_refresh_token(user_id, "bob", &config).unwrap();
        let second = create_refresh_token(user_id, "bob", &config).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let config = get_test_jwt_config();
        let token = create_access_token(Uuid::new_v4(), "alice", "user", &config).unwrap();

        // Access claims carry no `jti`, so decoding them as refresh claims fails.
        assert!(verify_refresh_token(&token, &config).is_err());
    }
}
