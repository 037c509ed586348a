//! Chat message persistence.

use async_trait::async_trait;
use sqlx::PgPool;

use super::model::ChatMessage;

#[derive(Debug, thiserror::Error)]
pub enum ChatStoreError {
    #[error("Chat database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Chat store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ChatMessageStore: Send + Sync {
    /// The `limit` most recent messages, oldest first.
    async fn recent(&self, limit: i64) -> Result<Vec<ChatMessage>, ChatStoreError>;

    async fn append(&self, sender: &str, message: &str) -> Result<ChatMessage, ChatStoreError>;
}

#[derive(Debug, Clone)]
pub struct PgChatStore {
    db: PgPool,
}

impl PgChatStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChatMessageStore for PgChatStore {
    async fn recent(&self, limit: i64) -> Result<Vec<ChatMessage>, ChatStoreError> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            "SELECT sender, message, created_at FROM (
                 SELECT id, sender, message, created_at FROM chat_messages
                 ORDER BY created_at DESC, id DESC
                 LIMIT $1
             ) latest
             ORDER BY created_at ASC, id ASC",
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(messages)
    }

    async fn append(&self, sender: &str, message: &str) -> Result<ChatMessage, ChatStoreError> {
        let saved = sqlx::query_as::<_, ChatMessage>(
            "INSERT INTO chat_messages (sender, message) VALUES ($1, $2)
             RETURNING sender, message, created_at",
        )
        .bind(sender)
        .bind(message)
        .fetch_one(&self.db)
        .await?;

        Ok(saved)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryChatStore;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::Utc;
    use tokio::sync::RwLock;

    use super::*;

    /// Vec-backed store. `set_unavailable(true)` makes every call fail.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryChatStore {
        messages: Arc<RwLock<Vec<ChatMessage>>>,
        unavailable: Arc<AtomicBool>,
    }

    impl MemoryChatStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        pub async fn all(&self) -> Vec<ChatMessage> {
            self.messages.read().await.clone()
        }

        fn check(&self) -> Result<(), ChatStoreError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(ChatStoreError::Unavailable("store offline".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ChatMessageStore for MemoryChatStore {
        async fn recent(&self, limit: i64) -> Result<Vec<ChatMessage>, ChatStoreError> {
            self.check()?;
            let messages = self.messages.read().await;
            let skip = messages.len().saturating_sub(limit.max(0) as usize);
            Ok(messages[skip..].to_vec())
        }

        async fn append(
            &self,
            sender: &str,
            message: &str,
        ) -> Result<ChatMessage, ChatStoreError> {
            self.check()?;
            let saved = ChatMessage {
                sender: sender.to_string(),
                message: message.to_string(),
                created_at: Utc::now(),
            };
            self.messages.write().await.push(saved.clone());
            Ok(saved)
        }
    }
}
