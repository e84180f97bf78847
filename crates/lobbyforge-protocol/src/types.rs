//! Event and snapshot types that travel on the wire.
//!
//! Field names are camelCase on the wire because the clients are
//! browser code. A few inbound fields also accept the names older clients
//! send (`university`, `userId`).

use std::fmt;

use chrono::{DateTime, Utc};
use lobbyforge_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifier of a room, unique for the lifetime of the registry that
/// issued it. Serialized as a plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a room.
///
/// ```text
/// Waiting ──(start_game)──→ Started
/// ```
///
/// `Started` is terminal: there is no way back to `Waiting`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Accepting joins and ready toggles.
    #[default]
    Waiting,
    /// A game is running; membership and ready flags are frozen.
    Started,
}

impl RoomStatus {
    /// Returns `true` if the room still accepts joins and ready toggles.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` once the game has started.
    pub fn is_started(self) -> bool {
        matches!(self, Self::Started)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Started => write!(f, "started"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One member of a room as other clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: ConnectionId,
    pub nickname: String,
    pub affiliation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub is_ready: bool,
}

/// Full state of one room. Members are listed in join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub id: RoomId,
    pub name: String,
    pub players: Vec<PlayerInfo>,
    pub max_players: usize,
    pub status: RoomStatus,
}

impl RoomInfo {
    /// Returns the member with the given connection, if present.
    pub fn player(&self, id: ConnectionId) -> Option<&PlayerInfo> {
        self.players.iter().find(|p| p.id == id)
    }
}

/// A row in the lobby's room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub status: RoomStatus,
}

/// Liveness report answered to a `health` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub rooms: usize,
    pub sessions: usize,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    /// A healthy report stamped with the current time.
    pub fn ok(rooms: usize, sessions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            rooms,
            sessions,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events a client sends to the lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Bind a player identity to this connection. Sending it again
    /// replaces the previous identity.
    Register {
        nickname: String,
        #[serde(alias = "university")]
        affiliation: String,
        #[serde(default, alias = "userId")]
        external_id: Option<String>,
    },

    /// Ask for the current room list.
    GetRooms,

    /// Create a room and become its first member.
    CreateRoom { room_name: String, max_players: usize },

    /// Join an existing room.
    JoinRoom { room_id: RoomId },

    /// Leave the current room. A no-op when not in one.
    LeaveRoom,

    /// Flip this player's ready flag.
    ToggleReady,

    /// Start the game in the current room.
    StartGame,

    /// Position update relayed to the rest of the room.
    Move { x: f64, y: f64 },

    /// Ask for a liveness report. Needs no registration.
    Health,
}

impl ClientEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::GetRooms => "getRooms",
            Self::CreateRoom { .. } => "createRoom",
            Self::JoinRoom { .. } => "joinRoom",
            Self::LeaveRoom => "leaveRoom",
            Self::ToggleReady => "toggleReady",
            Self::StartGame => "startGame",
            Self::Move { .. } => "move",
            Self::Health => "health",
        }
    }
}

/// Events the lobby pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Every room currently registered, in creation order.
    RoomListUpdate(Vec<RoomSummary>),

    /// Sent to the creator after `createRoom`.
    RoomCreated(RoomInfo),

    /// Sent to the joiner after `joinRoom`.
    RoomJoined(RoomInfo),

    /// Sent to a room's members whenever its state changes.
    RoomUpdate(RoomInfo),

    /// Sent to a room's members when its game starts.
    GameStarted(RoomInfo),

    /// Sent to a connection after it left its room.
    LeftRoom,

    /// Another member moved.
    PlayerMoved { id: ConnectionId, x: f64, y: f64 },

    /// Answer to `health`, sent to the asking connection only.
    Health(HealthReport),

    /// The last request from this connection failed. `code` follows HTTP
    /// conventions (400, 401, 404, 409, 500).
    Error { code: u16, message: String },
}

impl ServerEvent {
    /// Shorthand for building an [`Error`](Self::Error) event.
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomListUpdate(_) => "roomListUpdate",
            Self::RoomCreated(_) => "roomCreated",
            Self::RoomJoined(_) => "roomJoined",
            Self::RoomUpdate(_) => "roomUpdate",
            Self::GameStarted(_) => "gameStarted",
            Self::LeftRoom => "leftRoom",
            Self::PlayerMoved { .. } => "playerMoved",
            Self::Health(_) => "health",
            Self::Error { .. } => "error",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
