use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::instrument;
use utoipa::ToSchema;

use shopfront_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    AccessTokenResponse, CredentialsRequest, MessageResponse, RefreshRequest, TokenPairResponse,
};
use super::service::AuthService;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User registered successfully", body = MessageResponse),
        (status = 400, description = "Missing field or username already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let (username, password) = dto.parts().ok_or_else(|| {
        AppError::bad_request(anyhow::anyhow!("Username and Password required"))
    })?;

    AuthService::register(&state.db, username, password).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered")),
    ))
}

/// Login and receive an access and refresh token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenPairResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CredentialsRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let (username, password) = dto
        .parts()
        .ok_or_else(|| AppError::unauthorized("Invalid credentials".to_string()))?;

    let tokens = AuthService::login(&state.db, username, password, &state.jwt_config).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Missing, invalid or revoked refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let token = dto
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Refresh token required".to_string()))?;

    let response = AuthService::refresh(&state.db, &token, &state.jwt_config).await?;
    Ok(Json(response))
}

/// Revoke the stored refresh token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state), fields(user.id = %auth_user.id))]
pub async fn logout_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::logout(&state.db, auth_user.id).await?;
    Ok(Json(MessageResponse::new("Logout success")))
}
