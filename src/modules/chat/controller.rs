use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use shopfront_core::AppError;

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::sessions::{SocketIdentity, resolve_socket_identity};
use crate::state::AppState;

use super::hub::ChatHub;
use super::model::{ClientEvent, ServerEvent};

/// Open the chat websocket
///
/// The session cookie, if present, names the connection. Without one the
/// client joins as `Anonymous`.
#[utoipa::path(
    get,
    path = "/chat/ws",
    responses(
        (status = 101, description = "Switching to the websocket protocol"),
        (status = 401, description = "Session cookie signature is invalid", body = ErrorResponse),
        (status = 500, description = "Session store unavailable", body = ErrorResponse)
    ),
    tag = "Chat"
)]
#[instrument(skip(state, ws, headers))]
pub async fn chat_socket(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let cookie_header = headers.get(COOKIE).and_then(|v| v.to_str().ok());

    let identity = resolve_socket_identity(
        cookie_header,
        &state.session_config,
        state.sessions.as_ref(),
    )
    .await
    .map_err(|e| e.into_app_error())?;

    let hub = state.chat.clone();
    Ok(ws.on_upgrade(move |socket| handle_chat_socket(socket, hub, identity)))
}

async fn handle_chat_socket(socket: WebSocket, hub: Arc<ChatHub>, identity: SocketIdentity) {
    let (mut ws_write, mut ws_read) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let peer_id = hub.on_connect(identity.display_name(), tx).await;

    let mut write_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize chat event");
                    continue;
                }
            };
            if let Err(e) = ws_write.send(Message::Text(json.into())).await {
                debug!(error = %e, "Chat socket write error");
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = ws_read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(ClientEvent::ChatMessage(message)) => hub.on_message(peer_id, message).await,
                            Ok(ClientEvent::Typing) => hub.on_typing(peer_id).await,
                            Err(e) => debug!(chat.peer = peer_id, error = %e, "Ignoring malformed chat frame"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(chat.peer = peer_id, error = %e, "Chat socket read error");
                        break;
                    }
                }
            }
            _ = &mut write_task => {
                debug!(chat.peer = peer_id, "Chat socket writer finished");
                break;
            }
        }
    }

    hub.on_disconnect(peer_id).await;
    write_task.abort();
}
