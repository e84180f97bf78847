//! Room registry for Lobbyforge.
//!
//! Owns every room, its members and their ready flags, and the index of
//! which connection sits in which room. Everything here is synchronous:
//! the lobby coordinator holds the registry behind its lock and turns the
//! returned snapshots into events.
//!
//! # Room lifecycle
//!
//! ```text
//! create_room() ──→ Waiting ──start_game()──→ Started
//!                      │                         │
//!                      └──── last member leaves ─┴──→ (deleted)
//! ```
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms, routes players, enforces limits
//! - [`RoomConfig`]: capacity ceiling and start threshold
//! - [`Departure`]: what a leave did to the room
//! - [`RoomError`]: why a request was rejected

mod config;
mod error;
mod registry;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use lobbyforge_protocol::RoomStatus;
pub use registry::{Departure, RoomRegistry};
