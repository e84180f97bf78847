//! Per-connection handler: outbox writer, read loop, event dispatch.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbox with the relay and spawn the writer task
//!   2. Loop: receive frame → decode → run through the lobby → relay
//!   3. On exit (close, error, idle timeout, or unwinding) the guard
//!      removes the player from its room and the directory

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use lobbyforge_protocol::{ClientEvent, Codec, ConnectionId, ServerEvent};
use lobbyforge_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::server::ServerState;
use crate::{Effect, LobbyforgeError};

/// Drop guard that cleans up after a connection when the handler exits.
///
/// Runs even if the handler panics. Since `Drop` is synchronous, the
/// async cleanup is spawned as a fire-and-forget task.
struct ConnectionGuard<C: Codec> {
    connection: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let connection = self.connection;
        let state = Arc::clone(&self.state);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    state.disconnect(connection).await;
                });
            }
            Err(_) => {
                tracing::warn!(%connection, "no runtime, skipping cleanup");
            }
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), LobbyforgeError> {
    let connection = conn.id();
    let conn = Arc::new(conn);
    tracing::info!(%connection, "connection opened");

    let outbox = state.relay.register(connection).await;
    let _guard = ConnectionGuard {
        connection,
        state: Arc::clone(&state),
    };
    tokio::spawn(write_events(
        Arc::clone(&conn),
        outbox,
        Arc::clone(&state),
    ));

    let idle = loop {
        let received = match state.idle_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, conn.recv()).await {
                    Ok(received) => received,
                    Err(_) => break true,
                }
            }
            None => conn.recv().await,
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%connection, "connection closed cleanly");
                break false;
            }
            Err(e) => {
                tracing::debug!(%connection, error = %e, "recv error");
                break false;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                let err = LobbyforgeError::from(e);
                tracing::debug!(%connection, error = %err, "undecodable frame");
                state
                    .relay
                    .send_to(
                        connection,
                        ServerEvent::error(err.code(), err.to_string()),
                    )
                    .await;
                continue;
            }
        };

        dispatch(&state, connection, event).await;
    };

    if idle {
        tracing::info!(%connection, "connection idle, closing");
        conn.close().await?;
    }

    // _guard drops here → disconnect cleanup fires.
    Ok(())
}

/// Runs one event through the lobby and hands the effects to the relay.
///
/// The relay lock is taken before the lobby lock is released, so effects
/// from different connections reach the outboxes in lobby order.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    connection: ConnectionId,
    event: ClientEvent,
) {
    tracing::debug!(%connection, event = event.name(), "dispatching");

    let mut lobby = state.lobby.lock().await;
    let effects =
        match panic::catch_unwind(AssertUnwindSafe(|| lobby.handle(connection, event))) {
            Ok(effects) => effects,
            Err(_) => {
                tracing::error!(%connection, "lobby handler panicked");
                vec![Effect::to(
                    connection,
                    ServerEvent::error(500, "internal server error"),
                )]
            }
        };

    let mut relay = state.relay.lock().await;
    drop(lobby);
    relay.apply(effects);
}

/// Drains the connection's outbox onto the socket.
///
/// Ends when the relay drops the outbox (disconnect cleanup) or the
/// socket stops accepting writes.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut outbox: UnboundedReceiver<ServerEvent>,
    state: Arc<ServerState<C>>,
) {
    let connection = conn.id();
    while let Some(event) = outbox.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(
                    %connection,
                    event = event.name(),
                    error = %e,
                    "failed to encode event"
                );
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%connection, error = %e, "send failed, writer stopping");
            break;
        }
    }
}
