//! Wire protocol for Lobbyforge.
//!
//! Every frame is a single JSON object naming an event and carrying its
//! payload:
//!
//! ```text
//! { "event": "createRoom", "data": { "roomName": "Alpha", "maxPlayers": 4 } }
//! ```
//!
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): what clients send and
//!   what the lobby pushes back.
//! - **Snapshots** ([`RoomInfo`], [`RoomSummary`], [`PlayerInfo`]): the
//!   room state carried inside server events.
//! - **Codec** ([`Codec`], [`JsonCodec`]): bytes in, events out.
//!
//! The protocol layer knows nothing about locking or membership rules.
//! It only describes shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use lobbyforge_transport::ConnectionId;
pub use types::{
    ClientEvent, HealthReport, PlayerInfo, RoomId, RoomInfo, RoomStatus,
    RoomSummary, ServerEvent,
};
