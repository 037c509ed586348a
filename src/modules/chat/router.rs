use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::chat_socket;

pub fn init_chat_router() -> Router<AppState> {
    Router::new().route("/ws", get(chat_socket))
}
