//! The player identity bound to a connection.

use lobbyforge_protocol::ConnectionId;

/// Who a connection says it is.
///
/// Profiles are immutable and shared (`Arc<PlayerProfile>`) between the
/// session directory and room membership. Changing a nickname means
/// registering again, which produces a new profile; nothing edits one in
/// place. The ready flag is deliberately not here: it belongs to room
/// membership and only the room registry flips it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    /// The connection this player is speaking through.
    pub id: ConnectionId,

    /// Display name.
    pub nickname: String,

    /// Organization the player belongs to (school, club, team).
    pub affiliation: String,

    /// Identifier of the player's record in an external store, if the
    /// client was given one before connecting.
    pub external_id: Option<String>,
}
