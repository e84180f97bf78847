//! A single room and its members.

use std::sync::Arc;

use lobbyforge_protocol::{
    ConnectionId, PlayerInfo, RoomId, RoomInfo, RoomStatus, RoomSummary,
};
use lobbyforge_session::PlayerProfile;

/// One seat in a room: the shared profile plus the ready flag, which only
/// the registry may flip.
#[derive(Debug, Clone)]
pub(crate) struct Member {
    pub(crate) profile: Arc<PlayerProfile>,
    pub(crate) is_ready: bool,
}

impl Member {
    pub(crate) fn new(profile: Arc<PlayerProfile>) -> Self {
        Self {
            profile,
            is_ready: false,
        }
    }

    pub(crate) fn id(&self) -> ConnectionId {
        self.profile.id
    }

    fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.profile.id,
            nickname: self.profile.nickname.clone(),
            affiliation: self.profile.affiliation.clone(),
            external_id: self.profile.external_id.clone(),
            is_ready: self.is_ready,
        }
    }
}

/// Registry-owned state of one room.
#[derive(Debug)]
pub(crate) struct Room {
    pub(crate) id: RoomId,
    pub(crate) name: String,
    pub(crate) capacity: usize,
    pub(crate) status: RoomStatus,
    /// Join order.
    pub(crate) members: Vec<Member>,
}

impl Room {
    pub(crate) fn new(
        id: RoomId,
        name: String,
        capacity: usize,
        founder: Arc<PlayerProfile>,
    ) -> Self {
        Self {
            id,
            name,
            capacity,
            status: RoomStatus::Waiting,
            members: vec![Member::new(founder)],
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub(crate) fn all_ready(&self) -> bool {
        self.members.iter().all(|m| m.is_ready)
    }

    pub(crate) fn member_mut(&mut self, id: ConnectionId) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.id() == id)
    }

    /// Removes `id` from the member list. Returns `false` if absent.
    pub(crate) fn remove_member(&mut self, id: ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id() != id);
        self.members.len() != before
    }

    pub(crate) fn info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            players: self.members.iter().map(Member::info).collect(),
            max_players: self.capacity,
            status: self.status,
        }
    }

    pub(crate) fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id,
            name: self.name.clone(),
            player_count: self.members.len(),
            max_players: self.capacity,
            status: self.status,
        }
    }
}
