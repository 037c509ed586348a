//! Registry of live chat connections and the fan-out between them.
//!
//! Each connection registers an unbounded sender; the socket task on the
//! other end drains it into the websocket. Peers are kept in connect order
//! so the online list is stable.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info};

use crate::metrics;

use super::model::{HISTORY_LIMIT, OutgoingMessage, ServerEvent};
use super::store::ChatMessageStore;

pub type PeerId = u64;

struct Peer {
    name: String,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

pub struct ChatHub {
    next_id: AtomicU64,
    peers: RwLock<BTreeMap<PeerId, Peer>>,
    store: Arc<dyn ChatMessageStore>,
}

impl std::fmt::Debug for ChatHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHub").finish_non_exhaustive()
    }
}

fn send_time() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

impl ChatHub {
    pub fn new(store: Arc<dyn ChatMessageStore>) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            peers: RwLock::new(BTreeMap::new()),
            store,
        }
    }

    /// Display names of everyone connected, in connect order. Duplicates are kept.
    pub async fn online_users(&self) -> Vec<String> {
        self.peers
            .read()
            .await
            .values()
            .map(|p| p.name.clone())
            .collect()
    }

    pub async fn connection_count(&self) -> usize {
        self.peers.read().await.len()
    }

    /// Sends `event` to every peer except `skip`. Closed channels are ignored;
    /// their socket task is already tearing the peer down.
    fn fan_out(peers: &BTreeMap<PeerId, Peer>, event: &ServerEvent, skip: Option<PeerId>) {
        for (id, peer) in peers {
            if Some(*id) == skip {
                continue;
            }
            let _ = peer.tx.send(event.clone());
        }
    }

    async fn broadcast_online(&self) {
        let peers = self.peers.read().await;
        let names = peers.values().map(|p| p.name.clone()).collect();
        Self::fan_out(&peers, &ServerEvent::OnlineUsers(names), None);
    }

    /// Registers a connection, announces the new online list to everyone and
    /// replays recent history to the newcomer.
    pub async fn on_connect(&self, name: &str, tx: mpsc::UnboundedSender<ServerEvent>) -> PeerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.peers.write().await.insert(
            id,
            Peer {
                name: name.to_string(),
                tx: tx.clone(),
            },
        );
        metrics::track_chat_connection_opened();
        info!(chat.peer = id, chat.user = %name, "Chat connection opened");

        self.broadcast_online().await;

        match self.store.recent(HISTORY_LIMIT).await {
            Ok(history) => {
                let _ = tx.send(ServerEvent::ChatHistory(history));
            }
            Err(e) => error!(chat.peer = id, error = %e, "Failed to load chat history"),
        }

        id
    }

    /// Broadcasts a message to all peers, the sender included, then persists it.
    ///
    /// Persistence failures are logged; the broadcast has already happened.
    pub async fn on_message(&self, peer_id: PeerId, message: String) {
        let sender = {
            let peers = self.peers.read().await;
            let Some(peer) = peers.get(&peer_id) else {
                debug!(chat.peer = peer_id, "Message from unregistered peer dropped");
                return;
            };
            let sender = peer.name.clone();

            let event = ServerEvent::ChatMessage(OutgoingMessage {
                sender: sender.clone(),
                message: message.clone(),
                time: send_time(),
            });
            Self::fan_out(&peers, &event, None);
            sender
        };

        metrics::track_chat_message();

        if let Err(e) = self.store.append(&sender, &message).await {
            metrics::track_chat_persist_failure();
            error!(chat.peer = peer_id, error = %e, "Failed to persist chat message");
        }
    }

    /// Tells everyone but the typist who is typing.
    pub async fn on_typing(&self, peer_id: PeerId) {
        let peers = self.peers.read().await;
        if let Some(peer) = peers.get(&peer_id) {
            let event = ServerEvent::UserTyping(peer.name.clone());
            Self::fan_out(&peers, &event, Some(peer_id));
        }
    }

    pub async fn on_disconnect(&self, peer_id: PeerId) {
        let removed = self.peers.write().await.remove(&peer_id);
        let Some(peer) = removed else {
            return;
        };

        metrics::track_chat_connection_closed();
        info!(chat.peer = peer_id, chat.user = %peer.name, "Chat connection closed");

        self.broadcast_online().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::store::MemoryChatStore;

    fn hub_with_store() -> (ChatHub, MemoryChatStore) {
        let store = MemoryChatStore::new();
        (ChatHub::new(Arc::new(store.clone())), store)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_connect_broadcasts_online_and_sends_history() {
        let (hub, store) = hub_with_store();
        store.append("carol", "earlier").await.unwrap();

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        hub.on_connect("alice", tx_a).await;
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        hub.on_connect("Anonymous", tx_b).await;

        let alice_events = drain(&mut rx_a);
        assert_eq!(alice_events[0], ServerEvent::OnlineUsers(vec!["alice".into()]));
        assert!(matches!(&alice_events[1], ServerEvent::ChatHistory(h) if h.len() == 1));
        assert_eq!(
            alice_events[2],
            ServerEvent::OnlineUsers(vec!["alice".into(), "Anonymous".into()])
        );
        assert_eq!(alice_events.len(), 3);

        let anon_events = drain(&mut rx_b);
        assert_eq!(
            anon_events[0],
            ServerEvent::OnlineUsers(vec!["alice".into(), "Anonymous".into()])
        );
        assert!(matches!(&anon_events[1], ServerEvent::ChatHistory(h) if h[0].message == "earlier"));
    }

    #[tokio::test]
    async fn test_message_reaches_everyone_and_is_persisted() {
        let (hub, store) = hub_with_store();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let alice = hub.on_connect("alice", tx_a).await;
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        hub.on_connect("bob", tx_b).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        hub.on_message(alice, "hello".into()).await;

        for rx in [&mut rx_a, &mut rx_b] {
            match drain(rx).as_slice() {
                [ServerEvent::ChatMessage(m)] => {
                    assert_eq!(m.sender, "alice");
                    assert_eq!(m.message, "hello");
                    assert_eq!(m.time.len(), 8);
                }
                other => panic!("unexpected events: {other:?}"),
            }
        }

        let saved = store.all().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].sender, "alice");
    }

    #[tokio::test]
    async fn test_persist_failure_still_broadcasts() {
        let (hub, store) = hub_with_store();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.on_connect("alice", tx).await;
        drain(&mut rx);

        store.set_unavailable(true);
        hub.on_message(id, "lost".into()).await;

        assert!(matches!(drain(&mut rx).as_slice(), [ServerEvent::ChatMessage(_)]));
        store.set_unavailable(false);
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_history_failure_does_not_block_connect() {
        let (hub, store) = hub_with_store();
        store.set_unavailable(true);

        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.on_connect("alice", tx).await;

        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::OnlineUsers(vec!["alice".into()])]
        );
    }

    #[tokio::test]
    async fn test_typing_skips_the_typist() {
        let (hub, _) = hub_with_store();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let alice = hub.on_connect("alice", tx_a).await;
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        hub.on_connect("bob", tx_b).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        hub.on_typing(alice).await;

        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(drain(&mut rx_b), vec![ServerEvent::UserTyping("alice".into())]);
    }

    #[tokio::test]
    async fn test_disconnect_rebroadcasts_online_list() {
        let (hub, _) = hub_with_store();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        hub.on_connect("alice", tx_a).await;
        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        let bob = hub.on_connect("bob", tx_b).await;
        drain(&mut rx_a);

        hub.on_disconnect(bob).await;
        hub.on_disconnect(bob).await;

        assert_eq!(
            drain(&mut rx_a),
            vec![ServerEvent::OnlineUsers(vec!["alice".into()])]
        );
        assert_eq!(hub.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_listed_per_connection() {
        let (hub, _) = hub_with_store();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        hub.on_connect("Anonymous", tx_a).await;
        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        hub.on_connect("Anonymous", tx_b).await;

        assert_eq!(hub.online_users().await, vec!["Anonymous", "Anonymous"]);
    }
}
