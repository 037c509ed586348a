//! Real-time chat over a websocket, with the sender's name taken from the
//! HTTP session.

pub mod controller;
pub mod hub;
pub mod model;
pub mod router;
pub mod store;

pub use hub::ChatHub;
pub use model::*;
pub use router::init_chat_router;
pub use store::{ChatMessageStore, ChatStoreError, PgChatStore};

#[cfg(any(test, feature = "test-utils"))]
pub use store::MemoryChatStore;
