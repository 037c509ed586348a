use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{session_login, session_logout, session_me};

pub fn init_sessions_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(session_login))
        .route("/logout", post(session_logout))
        .route("/me", get(session_me))
}
