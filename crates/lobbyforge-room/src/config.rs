//! Room limits.

use serde::{Deserialize, Serialize};

/// Limits applied by a [`RoomRegistry`](crate::RoomRegistry) to every
/// room it manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Members required before a game may start. Values below 2 are
    /// treated as 2.
    pub min_players: usize,

    /// Largest capacity a client may request when creating a room.
    /// `None` accepts any capacity of 1 or more.
    pub max_capacity: Option<usize>,
}

impl RoomConfig {
    /// The effective start threshold.
    pub fn start_threshold(&self) -> usize {
        self.min_players.max(2)
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_capacity: None,
        }
    }
}
