//! # Lobbyforge
//!
//! Real-time lobby server for web games.
//!
//! Clients connect over WebSocket, register a nickname, then discover,
//! create, join and leave rooms, toggle a ready flag, and start a game.
//! Every member's view of a room is kept in step by pushing full room
//! snapshots whenever the room changes.
//!
//! ## Architecture
//!
//! ```text
//! frame ─→ handler ─→ Lobby::handle ─→ Vec<Effect> ─→ Relay ─→ outboxes ─→ writers
//!                     (under the lobby lock)         (enqueue only)
//! ```
//!
//! - [`Lobby`] owns the session directory and room registry and turns
//!   each client event into effects without touching the network.
//! - [`Relay`] owns per-connection outboxes and room broadcast groups.
//! - [`LobbyServer`] accepts connections and runs one task per client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lobbyforge::prelude::*;
//!
//! # async fn run() -> Result<(), LobbyforgeError> {
//! let server = LobbyServer::builder().bind("0.0.0.0:8000").build().await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod lobby;
mod relay;
mod server;

pub use error::LobbyforgeError;
pub use lobby::{Audience, Effect, Lobby};
pub use relay::{Relay, RelayGuard};
pub use server::{LobbyServer, LobbyServerBuilder};

/// Everything needed to run a server or drive a [`Lobby`] directly.
pub mod prelude {
    pub use crate::{
        Audience, Effect, Lobby, LobbyServer, LobbyServerBuilder,
        LobbyforgeError, Relay,
    };
    pub use lobbyforge_protocol::{
        ClientEvent, Codec, ConnectionId, HealthReport, JsonCodec, PlayerInfo,
        RoomId, RoomInfo, RoomStatus, RoomSummary, ServerEvent,
    };
    pub use lobbyforge_room::{RoomConfig, RoomError, RoomRegistry};
    pub use lobbyforge_session::{PlayerProfile, SessionDirectory, SessionError};
}
