//! Unified error type for Lobbyforge.

use lobbyforge_protocol::ProtocolError;
use lobbyforge_room::RoomError;
use lobbyforge_session::SessionError;
use lobbyforge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so
/// `?` converts sub-crate errors automatically. [`code`](Self::code)
/// turns any of them into the status carried by an `error` event.
#[derive(Debug, thiserror::Error)]
pub enum LobbyforgeError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The connection has not registered a player.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A rejected room operation.
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl LobbyforgeError {
    /// HTTP-style status code reported to the client.
    ///
    /// | code | meaning                                    |
    /// |------|--------------------------------------------|
    /// | 400  | malformed frame or invalid request values  |
    /// | 401  | no player registered on this connection    |
    /// | 404  | unknown room, or not in any room           |
    /// | 409  | request conflicts with the room's state    |
    /// | 500  | server-side failure                        |
    pub fn code(&self) -> u16 {
        match self {
            Self::Transport(_) => 500,
            Self::Protocol(ProtocolError::Encode(_)) => 500,
            Self::Protocol(_) => 400,
            Self::Session(SessionError::NotRegistered(_)) => 401,
            Self::Room(err) => match err {
                RoomError::InvalidCapacity { .. } => 400,
                RoomError::RoomNotFound(_) | RoomError::NotInRoom(_) => 404,
                RoomError::RoomFull(_)
                | RoomError::RoomAlreadyStarted(_)
                | RoomError::AlreadyInRoom(..)
                | RoomError::InsufficientPlayers { .. }
                | RoomError::NotAllReady(_) => 409,
            },
        }
    }
}
