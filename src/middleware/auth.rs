use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use shopfront_auth::verify_token;
use shopfront_core::AppError;

use crate::modules::auth::model::ROLE_ADMIN;
use crate::modules::auth::service::AuthService;
use crate::state::AppState;

/// Cookie consulted when no `Authorization` header is sent.
pub const TOKEN_COOKIE: &str = "token";

/// Extractor that validates the access token and loads the user it names.
///
/// The role is read from the database, so a demotion takes effect before the
/// token expires.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Reads a bearer token from the `Authorization` header, falling back to the
/// `token` cookie.
pub fn extract_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    CookieJar::from_headers(&parts.headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)
            .ok_or_else(|| AppError::unauthorized("Token required".to_string()))?;

        let claims = verify_token(&token, &state.jwt_config)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid or expired token".to_string()))?;

        let user = AuthService::find_user_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            role: user.role,
        })
    }
}
