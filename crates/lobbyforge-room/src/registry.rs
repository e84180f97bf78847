//! Room registry: creates, tracks, and routes players to rooms.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use lobbyforge_protocol::{
    ConnectionId, RoomId, RoomInfo, RoomStatus, RoomSummary,
};
use lobbyforge_session::PlayerProfile;

use crate::room::{Member, Room};
use crate::{RoomConfig, RoomError};

/// What happened to a room when a player left it.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    /// The room the player was in.
    pub room_id: RoomId,

    /// Snapshot of the room after the departure, or `None` if the player
    /// was its last member and the room was deleted.
    pub room: Option<RoomInfo>,
}

/// Owns every room and the connection → room index.
///
/// Every operation takes `&mut self` and updates the member list and the
/// index together, so a player is never observed in a room the index
/// doesn't point at (or the other way round). A player occupies at most
/// one room, and a room with no members does not exist.
#[derive(Debug)]
pub struct RoomRegistry {
    /// Keyed by id. Ids are handed out in increasing order, so iteration
    /// order is creation order.
    rooms: BTreeMap<RoomId, Room>,

    /// Which room each connection is currently in.
    memberships: HashMap<ConnectionId, RoomId>,

    next_room_id: u64,

    config: RoomConfig,
}

impl RoomRegistry {
    /// Creates an empty registry with the given limits.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: BTreeMap::new(),
            memberships: HashMap::new(),
            next_room_id: 1,
            config,
        }
    }

    /// The limits this registry enforces.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Summaries of every existing room, in creation order.
    ///
    /// Lazy: each summary is built as the iterator advances, and calling
    /// this again starts over from the first room.
    pub fn list_rooms(&self) -> impl Iterator<Item = RoomSummary> + '_ {
        self.rooms.values().map(Room::summary)
    }

    /// Creates a room with `founder` as its only member.
    ///
    /// # Errors
    /// - [`RoomError::InvalidCapacity`] if `capacity` is 0 or above the
    ///   configured maximum, when one is set.
    /// - [`RoomError::AlreadyInRoom`] if the founder is in another room.
    pub fn create_room(
        &mut self,
        name: impl Into<String>,
        founder: Arc<PlayerProfile>,
        capacity: usize,
    ) -> Result<RoomInfo, RoomError> {
        let over_limit =
            self.config.max_capacity.is_some_and(|max| capacity > max);
        if capacity == 0 || over_limit {
            return Err(RoomError::InvalidCapacity {
                requested: capacity,
                max: self.config.max_capacity,
            });
        }
        if let Some(current) = self.player_room(founder.id) {
            return Err(RoomError::AlreadyInRoom(founder.id, current));
        }

        let room_id = RoomId(self.next_room_id);
        self.next_room_id += 1;

        let founder_id = founder.id;
        let room = Room::new(room_id, name.into(), capacity, founder);
        let info = room.info();

        self.rooms.insert(room_id, room);
        self.memberships.insert(founder_id, room_id);

        tracing::info!(%room_id, founder = %founder_id, capacity, "room created");
        Ok(info)
    }

    /// Adds `player` to `room_id` as a not-ready member.
    ///
    /// # Errors
    /// Checked in this order:
    /// [`RoomError::RoomNotFound`], [`RoomError::AlreadyInRoom`],
    /// [`RoomError::RoomAlreadyStarted`], [`RoomError::RoomFull`].
    pub fn join_room(
        &mut self,
        room_id: RoomId,
        player: Arc<PlayerProfile>,
    ) -> Result<RoomInfo, RoomError> {
        if !self.rooms.contains_key(&room_id) {
            return Err(RoomError::RoomNotFound(room_id));
        }
        if let Some(current) = self.player_room(player.id) {
            return Err(RoomError::AlreadyInRoom(player.id, current));
        }

        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?;

        if !room.status.is_joinable() {
            return Err(RoomError::RoomAlreadyStarted(room_id));
        }
        if room.is_full() {
            return Err(RoomError::RoomFull(room_id));
        }

        let player_id = player.id;
        room.members.push(Member::new(player));
        let info = room.info();
        self.memberships.insert(player_id, room_id);

        tracing::info!(
            %room_id,
            player = %player_id,
            players = info.players.len(),
            "player joined room"
        );
        Ok(info)
    }

    /// Removes `player` from whatever room it is in.
    ///
    /// Returns `None` if the player was in no room. Deletes the room if
    /// the player was its last member. Leaving is allowed in any status,
    /// including after the game started.
    pub fn leave_room(&mut self, player: ConnectionId) -> Option<Departure> {
        let room_id = self.memberships.remove(&player)?;

        let Some(room) = self.rooms.get_mut(&room_id) else {
            tracing::warn!(%room_id, %player, "membership pointed at a missing room");
            return Some(Departure { room_id, room: None });
        };

        if room.remove_member(player) {
            tracing::info!(%room_id, %player, "player left room");
        } else {
            tracing::warn!(
                %room_id,
                %player,
                "membership pointed at a room without the player"
            );
        }

        if room.members.is_empty() {
            self.rooms.remove(&room_id);
            tracing::info!(%room_id, "room deleted");
            return Some(Departure { room_id, room: None });
        }

        Some(Departure {
            room_id,
            room: Some(room.info()),
        })
    }

    /// Flips the ready flag of `player` in its current room.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`] if the player is in no room.
    /// - [`RoomError::RoomAlreadyStarted`] once the game has started.
    pub fn toggle_ready(
        &mut self,
        player: ConnectionId,
    ) -> Result<RoomInfo, RoomError> {
        let room_id = self
            .player_room(player)
            .ok_or(RoomError::NotInRoom(player))?;
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?;

        if room.status.is_started() {
            return Err(RoomError::RoomAlreadyStarted(room_id));
        }

        let member = room
            .member_mut(player)
            .ok_or(RoomError::NotInRoom(player))?;
        member.is_ready = !member.is_ready;
        let is_ready = member.is_ready;

        tracing::debug!(%room_id, %player, is_ready, "ready toggled");
        Ok(room.info())
    }

    /// Moves the room of `player` from Waiting to Started.
    ///
    /// Any member may start the game.
    ///
    /// # Errors
    /// Checked in this order:
    /// [`RoomError::NotInRoom`], [`RoomError::RoomAlreadyStarted`],
    /// [`RoomError::InsufficientPlayers`], [`RoomError::NotAllReady`].
    pub fn start_game(
        &mut self,
        player: ConnectionId,
    ) -> Result<RoomInfo, RoomError> {
        let room_id = self
            .player_room(player)
            .ok_or(RoomError::NotInRoom(player))?;
        let need = self.config.start_threshold();
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?;

        if room.status.is_started() {
            return Err(RoomError::RoomAlreadyStarted(room_id));
        }
        if room.members.len() < need {
            return Err(RoomError::InsufficientPlayers {
                room: room_id,
                have: room.members.len(),
                need,
            });
        }
        if !room.all_ready() {
            return Err(RoomError::NotAllReady(room_id));
        }

        room.status = RoomStatus::Started;
        tracing::info!(%room_id, started_by = %player, "game started");
        Ok(room.info())
    }

    /// Replaces the stored profile of `profile.id` in its room, keeping
    /// the ready flag. Returns the updated snapshot, or `None` if the
    /// player is in no room.
    pub fn refresh_profile(
        &mut self,
        profile: Arc<PlayerProfile>,
    ) -> Option<RoomInfo> {
        let room_id = self.player_room(profile.id)?;
        let room = self.rooms.get_mut(&room_id)?;
        let member = room.member_mut(profile.id)?;
        member.profile = profile;
        Some(room.info())
    }

    /// The room `player` is currently in, if any.
    pub fn player_room(&self, player: ConnectionId) -> Option<RoomId> {
        self.memberships.get(&player).copied()
    }

    /// Snapshot of one room.
    pub fn room(&self, room_id: RoomId) -> Option<RoomInfo> {
        self.rooms.get(&room_id).map(Room::info)
    }

    /// Number of existing rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Deletes every room. Used on shutdown. Room ids keep counting up.
    pub fn clear(&mut self) {
        let rooms = self.rooms.len();
        self.rooms.clear();
        self.memberships.clear();
        tracing::debug!(rooms, "room registry cleared");
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================
