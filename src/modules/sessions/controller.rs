use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{debug, instrument};

use shopfront_auth::{sign_session_id, unsign_session_id};
use shopfront_config::SessionConfig;
use shopfront_core::AppError;

use crate::modules::auth::{CredentialsRequest, MessageResponse};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;

use super::model::{CurrentUserResponse, SessionLoginResponse};
use super::service::SessionService;

fn invalid_body<R>(_rejection: R) -> AppError {
    AppError::bad_request(anyhow::anyhow!("Invalid request body"))
}

/// Credentials from either an HTML form post or a JSON body.
pub struct LoginForm(pub CredentialsRequest);

impl<S> FromRequest<S> for LoginForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let dto = if is_form {
            Form::<CredentialsRequest>::from_request(req, state)
                .await
                .map(|Form(dto)| dto)
                .map_err(invalid_body)?
        } else {
            Json::<CredentialsRequest>::from_request(req, state)
                .await
                .map(|Json(dto)| dto)
                .map_err(invalid_body)?
        };

        Ok(Self(dto))
    }
}

fn session_cookie(value: String, config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), value))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(config.max_age_secs))
        .secure(config.secure)
        .build()
}

/// The verified session id carried by the request, if any.
fn session_id_from_jar(jar: &CookieJar, config: &SessionConfig) -> Option<String> {
    let cookie = jar.get(&config.cookie_name)?;
    match unsign_session_id(cookie.value(), &config.secret) {
        Ok(id) => Some(id),
        Err(e) => {
            debug!(error = %e, "Ignoring unusable session cookie");
            None
        }
    }
}

fn not_logged_in() -> AppError {
    AppError::unauthorized("Not logged in".to_string())
}

/// Log in with a server-side session cookie
#[utoipa::path(
    post,
    path = "/session/login",
    request_body(content = CredentialsRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Session created, cookie set", body = SessionLoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "Sessions"
)]
#[instrument(skip(state, jar, form))]
pub async fn session_login(
    State(state): State<AppState>,
    jar: CookieJar,
    LoginForm(form): LoginForm,
) -> Result<(CookieJar, Json<SessionLoginResponse>), AppError> {
    let (username, password) = form
        .parts()
        .ok_or_else(|| AppError::unauthorized("Invalid credentials".to_string()))?;

    let (session_id, user) = SessionService::login(
        &state.db,
        state.sessions.as_ref(),
        &state.session_config,
        username,
        password,
    )
    .await?;

    let signed = sign_session_id(&session_id, &state.session_config.secret);
    let jar = jar.add(session_cookie(signed, &state.session_config));

    Ok((
        jar,
        Json(SessionLoginResponse {
            message: "Login success".to_string(),
            username: user.username,
        }),
    ))
}

/// Destroy the current session and clear its cookie
#[utoipa::path(
    post,
    path = "/session/logout",
    responses(
        (status = 200, description = "Session destroyed", body = MessageResponse)
    ),
    tag = "Sessions"
)]
#[instrument(skip(state, jar))]
pub async fn session_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(session_id) = session_id_from_jar(&jar, &state.session_config) {
        SessionService::logout(state.sessions.as_ref(), &session_id).await?;
    }

    let jar = jar.remove(Cookie::build(state.session_config.cookie_name.clone()).path("/"));

    Ok((jar, Json(MessageResponse::new("Logout success"))))
}

/// The user logged in on this session
#[utoipa::path(
    get,
    path = "/session/me",
    responses(
        (status = 200, description = "Current session user", body = CurrentUserResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    tag = "Sessions"
)]
#[instrument(skip(state, jar))]
pub async fn session_me(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<CurrentUserResponse>, AppError> {
    let session_id = session_id_from_jar(&jar, &state.session_config).ok_or_else(not_logged_in)?;

    let user = SessionService::current_user(state.sessions.as_ref(), &session_id)
        .await?
        .ok_or_else(not_logged_in)?;

    Ok(Json(CurrentUserResponse {
        username: user.username,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let config = SessionConfig::default();
        let cookie = session_cookie("s:abc.sig".to_string(), &config);

        assert_eq!(cookie.name(), "connect.sid");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(
            cookie.max_age(),
            Some(cookie::time::Duration::seconds(3600))
        );
    }

    #[test]
    fn test_session_id_from_jar_requires_valid_signature() {
        let config = SessionConfig::default();
        let signed = sign_session_id("abc", &config.secret);

        let jar = CookieJar::new().add(Cookie::new("connect.sid", signed));
        assert_eq!(session_id_from_jar(&jar, &config).as_deref(), Some("abc"));

        let forged = CookieJar::new().add(Cookie::new("connect.sid", "s:abc.bogus"));
        assert_eq!(session_id_from_jar(&forged, &config), None);

        assert_eq!(session_id_from_jar(&CookieJar::new(), &config), None);
    }
}
