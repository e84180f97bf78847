//! Error types for the session layer.

use lobbyforge_protocol::ConnectionId;

/// Errors that can occur when resolving a connection to a player.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection sent a request that needs a player identity before
    /// it ever registered one (or after it was removed).
    #[error("connection {0} has not registered a player")]
    NotRegistered(ConnectionId),
}
