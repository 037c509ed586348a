//! Cookie-backed server-side sessions and the bridge that lets websocket
//! connections reuse them.

pub mod bridge;
pub mod controller;
pub mod model;
pub mod router;
pub mod service;
pub mod store;

pub use bridge::{BridgeError, SocketIdentity, resolve_socket_identity};
pub use model::*;
pub use router::init_sessions_router;
pub use store::{PgSessionStore, SessionStore, SessionStoreError};

#[cfg(any(test, feature = "test-utils"))]
pub use store::MemorySessionStore;
