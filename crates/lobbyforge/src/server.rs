//! `LobbyServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → lobby → relay.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use lobbyforge_protocol::{Codec, ConnectionId, JsonCodec};
use lobbyforge_room::RoomConfig;
use lobbyforge_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{Lobby, LobbyforgeError, Relay};

/// Shared server state passed to each connection handler task.
///
/// `lobby` is the single serialization point for every state change.
/// `relay` has its own lock and is only ever taken after `lobby`.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) lobby: Mutex<Lobby>,
    pub(crate) relay: Relay,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Option<Duration>,
}

impl<C: Codec> ServerState<C> {
    /// Runs disconnect cleanup for `connection` and closes its outbox.
    pub(crate) async fn disconnect(&self, connection: ConnectionId) {
        let mut lobby = self.lobby.lock().await;
        let effects = lobby.disconnect(connection);
        let mut relay = self.relay.lock().await;
        drop(lobby);
        relay.apply(effects);
        drop(relay);

        self.relay.unregister(connection).await;
    }
}

/// Builder for configuring and starting a lobby server.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use lobbyforge::prelude::*;
///
/// # async fn run() -> Result<(), LobbyforgeError> {
/// let server = LobbyServer::builder()
///     .bind("0.0.0.0:8000")
///     .room_config(RoomConfig {
///         max_capacity: Some(8),
///         ..RoomConfig::default()
///     })
///     .idle_timeout(Duration::from_secs(300))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct LobbyServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    idle_timeout: Option<Duration>,
}

impl LobbyServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            room_config: RoomConfig::default(),
            idle_timeout: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the limits applied to every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Closes connections that send nothing for `timeout`. Off by default.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<LobbyServer<JsonCodec>, LobbyforgeError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            lobby: Mutex::new(Lobby::new(self.room_config)),
            relay: Relay::new(),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(LobbyServer { transport, state })
    }
}

impl Default for LobbyServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound lobby server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to
/// start accepting connections.
pub struct LobbyServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl LobbyServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> LobbyServerBuilder {
        LobbyServerBuilder::new()
    }
}

impl<C: Codec> LobbyServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), LobbyforgeError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves, then clears every
    /// room and player.
    ///
    /// Connection tasks already running are not waited for. Their
    /// cleanup finds an empty lobby and does nothing.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), LobbyforgeError> {
        let addr = self.local_addr().ok();
        tracing::info!(?addr, "lobby server running");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.state.lobby.lock().await.clear();
        tracing::info!("lobby server stopped");
        Ok(())
    }
}
