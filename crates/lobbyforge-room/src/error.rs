//! Error types for the room layer.

use lobbyforge_protocol::{ConnectionId, RoomId};

/// Errors that can occur during room operations.
///
/// Every variant is a rejected request: the registry is left exactly as
/// it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The requested capacity is zero or above the configured maximum.
    #[error("invalid room capacity {requested}")]
    InvalidCapacity {
        requested: usize,
        max: Option<usize>,
    },

    /// The room does not exist (never did, or its last member left).
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The room has no free slot.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The room's game has already started.
    #[error("room {0} has already started")]
    RoomAlreadyStarted(RoomId),

    /// The connection already occupies a room and must leave it first.
    #[error("{0} is already in room {1}")]
    AlreadyInRoom(ConnectionId, RoomId),

    /// The connection is not in any room.
    #[error("{0} is not in any room")]
    NotInRoom(ConnectionId),

    /// Too few members to start.
    #[error("room {room} needs at least {need} players to start, has {have}")]
    InsufficientPlayers { room: RoomId, have: usize, need: usize },

    /// At least one member has not toggled ready.
    #[error("not every player in room {0} is ready")]
    NotAllReady(RoomId),
}
