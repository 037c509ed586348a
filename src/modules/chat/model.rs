use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Number of messages replayed to a newly connected client.
pub const HISTORY_LIMIT: i64 = 20;

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A live message as broadcast to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OutgoingMessage {
    pub sender: String,
    pub message: String,
    /// Wall-clock send time, `HH:MM:SS` UTC.
    pub time: String,
}

/// Frames a client may send: `{"event": "...", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "chat message")]
    ChatMessage(String),
    #[serde(rename = "typing")]
    Typing,
}

/// Frames the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "online users")]
    OnlineUsers(Vec<String>),
    #[serde(rename = "chat history")]
    ChatHistory(Vec<ChatMessage>),
    #[serde(rename = "chat message")]
    ChatMessage(OutgoingMessage),
    #[serde(rename = "user typing")]
    UserTyping(String),
}
