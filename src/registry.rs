//! Connection registry: the single owner of all mutable shared state.
//!
//! Tracks every live WebSocket session, its optional channel subscription,
//! and the presence count derived from the map. All mutations go through one
//! mutex so concurrent admissions never collide on an identifier and the
//! `user-count` broadcast always carries the post-mutation value.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use axum::extract::ws::Message;
use serde::Serialize;

use crate::ws::protocol::ServerMessage;
use crate::ws::ConnectionSender;

/// Opaque per-connection identifier, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live participant session: its outbound queue and current subscription.
struct ConnectionEntry {
    sender: ConnectionSender,
    channel: Option<String>,
}

#[derive(Default)]
struct RegistryInner {
    connections: HashMap<SessionId, ConnectionEntry>,
    next_id: u64,
}

/// Registry service object, constructed in `main` and shared via `AppState`.
///
/// Outbound sends are non-blocking pushes onto each connection's unbounded
/// queue, so fanning out while the lock is held cannot stall; it also keeps
/// `user-count` broadcasts in mutation order across racing admissions.
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// Register a new connection and announce the updated presence count to
    /// every connection, the new one included.
    pub fn admit(&self, sender: ConnectionSender) -> SessionId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = SessionId(inner.next_id);
        inner.connections.insert(
            id,
            ConnectionEntry {
                sender,
                channel: None,
            },
        );
        broadcast_user_count(&inner);
        id
    }

    /// Idempotent removal. Duplicate or late teardown signals are silently
    /// absorbed; presence is re-announced only when an entry actually left.
    pub fn remove(&self, id: SessionId) {
        let mut inner = self.lock();
        if inner.connections.remove(&id).is_some() {
            broadcast_user_count(&inner);
        }
    }

    /// Overwrite the connection's channel subscription. Does not validate the
    /// channel id; resolution is the caller's concern.
    pub fn set_channel(&self, id: SessionId, channel: &str) {
        if let Some(entry) = self.lock().connections.get_mut(&id) {
            entry.channel = Some(channel.to_string());
        }
    }

    /// Current channel subscription of a connection, if any.
    pub fn subscription(&self, id: SessionId) -> Option<String> {
        self.lock()
            .connections
            .get(&id)
            .and_then(|entry| entry.channel.clone())
    }

    /// Number of currently connected participants.
    pub fn count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Send a message to one connection only.
    pub fn send_to(&self, id: SessionId, message: &ServerMessage) {
        let Some(msg) = encode(message) else { return };
        let inner = self.lock();
        if let Some(entry) = inner.connections.get(&id) {
            let _ = entry.sender.send(msg);
        }
    }

    /// Fan a message out to every connection except the originator.
    /// Send failures mean the peer is tearing down; they are ignored and
    /// never affect delivery to the others.
    pub fn broadcast_except(&self, exclude: SessionId, message: &ServerMessage) {
        let Some(msg) = encode(message) else { return };
        let inner = self.lock();
        for (id, entry) in inner.connections.iter() {
            if *id != exclude {
                let _ = entry.sender.send(msg.clone());
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().expect("registry lock poisoned")
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Announce the current presence count to all registered connections.
/// Called under the registry lock so the count is exactly the map size at
/// the moment of the triggering mutation.
fn broadcast_user_count(inner: &RegistryInner) {
    let message = ServerMessage::UserCount {
        count: inner.connections.len(),
    };
    let Some(msg) = encode(&message) else { return };
    for entry in inner.connections.values() {
        let _ = entry.sender.send(msg.clone());
    }
}

/// Encode a server message as a text WebSocket frame.
fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode server message");
            None
        }
    }
}
