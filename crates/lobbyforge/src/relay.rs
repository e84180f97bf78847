//! Event relay: fans lobby effects out to per-connection outboxes.
//!
//! Each live connection owns an unbounded outbox drained by its writer
//! task. The relay also owns the room broadcast groups, which change
//! only through [`Effect::Subscribe`] and [`Effect::Unsubscribe`].
//! Nothing here awaits the network: applying effects only enqueues.
//!
//! Callers that mutate the lobby take the relay lock *before* releasing
//! the lobby lock (see [`Relay::lock`]), so effects reach the outboxes in
//! the same order the lobby produced them.

use std::collections::{BTreeSet, HashMap};

use lobbyforge_protocol::{ConnectionId, RoomId, ServerEvent};
use tokio::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::lobby::{Audience, Effect};

/// Outbound half of a connection, as seen by the relay.
type Outbox = UnboundedSender<ServerEvent>;

#[derive(Debug, Default)]
struct RelayState {
    outboxes: HashMap<ConnectionId, Outbox>,
    groups: HashMap<RoomId, BTreeSet<ConnectionId>>,
}

impl RelayState {
    fn subscribe(&mut self, connection: ConnectionId, room: RoomId) {
        self.groups.entry(room).or_default().insert(connection);
    }

    fn unsubscribe(&mut self, connection: ConnectionId, room: RoomId) {
        if let Some(members) = self.groups.get_mut(&room) {
            members.remove(&connection);
            if members.is_empty() {
                self.groups.remove(&room);
            }
        }
    }

    fn emit(&self, audience: Audience, event: ServerEvent) {
        match audience {
            Audience::Connection(connection) => {
                self.deliver(connection, event);
            }
            Audience::Room(room) => {
                for connection in self.group(room) {
                    self.deliver(*connection, event.clone());
                }
            }
            Audience::RoomExcept(room, excluded) => {
                for connection in self.group(room) {
                    if *connection != excluded {
                        self.deliver(*connection, event.clone());
                    }
                }
            }
            Audience::Everyone => {
                for connection in self.outboxes.keys() {
                    self.deliver(*connection, event.clone());
                }
            }
        }
    }

    fn group(&self, room: RoomId) -> impl Iterator<Item = &ConnectionId> {
        self.groups.get(&room).into_iter().flatten()
    }

    /// Enqueues `event` for `connection`. Silently drops it if the
    /// connection is gone or its writer has stopped.
    fn deliver(&self, connection: ConnectionId, event: ServerEvent) {
        let Some(outbox) = self.outboxes.get(&connection) else {
            return;
        };
        if outbox.send(event).is_err() {
            tracing::debug!(%connection, "outbox closed, event dropped");
        }
    }
}

/// Routes server events to connections and room groups.
#[derive(Debug, Default)]
pub struct Relay {
    state: Mutex<RelayState>,
}

impl Relay {
    /// Creates a relay with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an outbox for `connection` and returns its receiving end.
    ///
    /// Registering the same connection again replaces the previous
    /// outbox.
    pub async fn register(
        &self,
        connection: ConnectionId,
    ) -> UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().await.outboxes.insert(connection, tx);
        rx
    }

    /// Closes the outbox of `connection` and drops it from every group.
    pub async fn unregister(&self, connection: ConnectionId) {
        let mut state = self.state.lock().await;
        state.outboxes.remove(&connection);
        state.groups.retain(|_, members| {
            members.remove(&connection);
            !members.is_empty()
        });
    }

    /// Locks the relay for a batch of effects.
    ///
    /// Lock order is always lobby, then relay. Never take the lobby lock
    /// while holding a `RelayGuard`.
    pub async fn lock(&self) -> RelayGuard<'_> {
        RelayGuard {
            state: self.state.lock().await,
        }
    }

    /// Carries out `effects` in order.
    pub async fn apply(&self, effects: impl IntoIterator<Item = Effect>) {
        self.lock().await.apply(effects);
    }

    /// Enqueues a single event for `connection`.
    pub async fn send_to(&self, connection: ConnectionId, event: ServerEvent) {
        self.state.lock().await.deliver(connection, event);
    }

    /// Number of connections with an open outbox.
    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.outboxes.len()
    }

    /// Connections subscribed to `room`, in id order.
    pub async fn group_members(&self, room: RoomId) -> Vec<ConnectionId> {
        self.state.lock().await.group(room).copied().collect()
    }
}

/// Exclusive access to the relay, obtained from [`Relay::lock`].
pub struct RelayGuard<'a> {
    state: MutexGuard<'a, RelayState>,
}

impl RelayGuard<'_> {
    /// Carries out `effects` in order.
    pub fn apply(&mut self, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            match effect {
                Effect::Subscribe { connection, room } => {
                    self.state.subscribe(connection, room);
                }
                Effect::Unsubscribe { connection, room } => {
                    self.state.unsubscribe(connection, room);
                }
                Effect::Emit { audience, event } => {
                    self.state.emit(audience, event);
                }
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
