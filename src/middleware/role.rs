//! Role checks for authenticated routes.

use axum::{extract::FromRequestParts, http::request::Parts};

use shopfront_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Extractor that only admits users whose role is `admin`.
///
/// Authentication failures keep their 401; a valid non-admin user gets 403.
///
/// ```rust,ignore
/// async fn delete_product(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     // only reached by admins
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

/// Returns the user if they are an admin.
pub fn ensure_admin(user: AuthUser) -> Result<AuthUser, AppError> {
    if user.is_admin() {
        Ok(user)
    } else {
        Err(AppError::forbidden("Forbidden".to_string()))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        ensure_admin(user).map(RequireAdmin)
    }
}
