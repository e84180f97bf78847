//! The lobby coordinator: one client event in, a list of effects out.
//!
//! [`Lobby`] owns the session directory and the room registry and knows
//! the lobby's rules. It never touches a socket. Every call returns the
//! group changes and emits the [`Relay`](crate::Relay) must carry out,
//! in order, once the caller has released the lobby lock.

use lobbyforge_protocol::{
    ClientEvent, ConnectionId, HealthReport, RoomId, ServerEvent,
};
use lobbyforge_room::{Departure, RoomConfig, RoomRegistry};
use lobbyforge_session::SessionDirectory;

use crate::LobbyforgeError;

/// Who receives an emitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// A single connection.
    Connection(ConnectionId),
    /// Every connection subscribed to the room.
    Room(RoomId),
    /// Every connection subscribed to the room except one.
    RoomExcept(RoomId, ConnectionId),
    /// Every live connection.
    Everyone,
}

/// One step the relay performs after a lobby operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Add the connection to the room's broadcast group.
    Subscribe { connection: ConnectionId, room: RoomId },
    /// Remove the connection from the room's broadcast group.
    Unsubscribe { connection: ConnectionId, room: RoomId },
    /// Deliver an event.
    Emit { audience: Audience, event: ServerEvent },
}

impl Effect {
    pub fn to(connection: ConnectionId, event: ServerEvent) -> Self {
        Self::Emit {
            audience: Audience::Connection(connection),
            event,
        }
    }

    pub fn to_room(room: RoomId, event: ServerEvent) -> Self {
        Self::Emit {
            audience: Audience::Room(room),
            event,
        }
    }

    pub fn to_everyone(event: ServerEvent) -> Self {
        Self::Emit {
            audience: Audience::Everyone,
            event,
        }
    }
}

/// Session directory and room registry, mutated together.
///
/// Each method runs to completion on `&mut self`. The server keeps the
/// lobby behind a single `tokio::sync::Mutex`, which makes every
/// operation (disconnect cleanup included) atomic with respect to every
/// other.
#[derive(Debug, Default)]
pub struct Lobby {
    sessions: SessionDirectory,
    rooms: RoomRegistry,
}

impl Lobby {
    /// Creates an empty lobby whose rooms follow `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            sessions: SessionDirectory::new(),
            rooms: RoomRegistry::new(config),
        }
    }

    /// Handles one client event from `connection`.
    ///
    /// A rejected request produces exactly one `error` event addressed to
    /// `connection` and leaves the lobby unchanged.
    pub fn handle(
        &mut self,
        connection: ConnectionId,
        event: ClientEvent,
    ) -> Vec<Effect> {
        let name = event.name();
        match self.apply(connection, event) {
            Ok(effects) => effects,
            Err(err) => {
                tracing::debug!(
                    %connection,
                    event = name,
                    code = err.code(),
                    error = %err,
                    "request rejected"
                );
                vec![Effect::to(
                    connection,
                    ServerEvent::error(err.code(), err.to_string()),
                )]
            }
        }
    }

    /// Removes every trace of `connection`: its room seat (notifying the
    /// rest of the room) and its directory entry.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(departure) = self.rooms.leave_room(connection) {
            self.departure_effects(connection, departure, &mut effects);
        }
        self.sessions.remove(connection);
        tracing::info!(%connection, "connection cleaned up");
        effects
    }

    /// Forgets every player and room.
    pub fn clear(&mut self) {
        self.rooms.clear();
        self.sessions.clear();
    }

    /// Liveness report with the current room and session counts.
    pub fn status(&self) -> HealthReport {
        HealthReport::ok(self.rooms.room_count(), self.sessions.len())
    }

    pub fn sessions(&self) -> &SessionDirectory {
        &self.sessions
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    fn apply(
        &mut self,
        connection: ConnectionId,
        event: ClientEvent,
    ) -> Result<Vec<Effect>, LobbyforgeError> {
        match event {
            ClientEvent::Register {
                nickname,
                affiliation,
                external_id,
            } => {
                let profile = self.sessions.register(
                    connection,
                    nickname,
                    affiliation,
                    external_id,
                );

                let mut effects = Vec::with_capacity(2);
                if let Some(room) = self.rooms.refresh_profile(profile) {
                    effects.push(Effect::to_room(room.id, ServerEvent::RoomUpdate(room)));
                }
                effects.push(Effect::to(connection, self.room_list()));
                Ok(effects)
            }

            ClientEvent::GetRooms => {
                Ok(vec![Effect::to(connection, self.room_list())])
            }

            ClientEvent::CreateRoom {
                room_name,
                max_players,
            } => {
                let founder = self.sessions.require(connection)?;
                let room =
                    self.rooms.create_room(room_name, founder, max_players)?;
                let room_id = room.id;

                Ok(vec![
                    Effect::Subscribe {
                        connection,
                        room: room_id,
                    },
                    Effect::to(connection, ServerEvent::RoomCreated(room)),
                    Effect::to_everyone(self.room_list()),
                ])
            }

            ClientEvent::JoinRoom { room_id } => {
                let player = self.sessions.require(connection)?;
                let room = self.rooms.join_room(room_id, player)?;

                Ok(vec![
                    Effect::Subscribe {
                        connection,
                        room: room_id,
                    },
                    Effect::to(connection, ServerEvent::RoomJoined(room.clone())),
                    Effect::to_room(room_id, ServerEvent::RoomUpdate(room)),
                    Effect::to_everyone(self.room_list()),
                ])
            }

            ClientEvent::LeaveRoom => {
                let mut effects = Vec::new();
                if let Some(departure) = self.rooms.leave_room(connection) {
                    self.departure_effects(connection, departure, &mut effects);
                    effects.push(Effect::to(connection, ServerEvent::LeftRoom));
                }
                Ok(effects)
            }

            ClientEvent::ToggleReady => {
                let room = self.rooms.toggle_ready(connection)?;
                Ok(vec![
                    Effect::to_room(room.id, ServerEvent::RoomUpdate(room)),
                    Effect::to_everyone(self.room_list()),
                ])
            }

            ClientEvent::StartGame => {
                let room = self.rooms.start_game(connection)?;
                Ok(vec![
                    Effect::to_room(room.id, ServerEvent::GameStarted(room)),
                    Effect::to_everyone(self.room_list()),
                ])
            }

            ClientEvent::Move { x, y } => {
                // Not in a room: nobody to tell.
                let Some(room_id) = self.rooms.player_room(connection) else {
                    return Ok(Vec::new());
                };
                Ok(vec![Effect::Emit {
                    audience: Audience::RoomExcept(room_id, connection),
                    event: ServerEvent::PlayerMoved {
                        id: connection,
                        x,
                        y,
                    },
                }])
            }

            ClientEvent::Health => Ok(vec![Effect::to(
                connection,
                ServerEvent::Health(self.status()),
            )]),
        }
    }

    /// Effects shared by an explicit leave and a disconnect.
    fn departure_effects(
        &self,
        connection: ConnectionId,
        departure: Departure,
        effects: &mut Vec<Effect>,
    ) {
        effects.push(Effect::Unsubscribe {
            connection,
            room: departure.room_id,
        });
        if let Some(room) = departure.room {
            effects.push(Effect::to_room(
                departure.room_id,
                ServerEvent::RoomUpdate(room),
            ));
        }
        effects.push(Effect::to_everyone(self.room_list()));
    }

    fn room_list(&self) -> ServerEvent {
        ServerEvent::RoomListUpdate(self.rooms.list_rooms().collect())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use lobbyforge_protocol::{RoomInfo, RoomStatus};

    use super::*;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn lobby() -> Lobby {
        Lobby::new(RoomConfig::default())
    }

    fn register(lobby: &mut Lobby, id: u64) -> Vec<Effect> {
        lobby.handle(
            cid(id),
            ClientEvent::Register {
                nickname: format!("player-{id}"),
                affiliation: "Zion U".into(),
                external_id: None,
            },
        )
    }

    fn create(lobby: &mut Lobby, id: u64, capacity: usize) -> RoomId {
        let effects = lobby.handle(
            cid(id),
            ClientEvent::CreateRoom {
                room_name: "Alpha".into(),
                max_players: capacity,
            },
        );
        match &effects[1] {
            Effect::Emit {
                event: ServerEvent::RoomCreated(room),
                ..
            } => room.id,
            other => panic!("expected roomCreated, got {other:?}"),
        }
    }

    /// The single error emitted to `id`, as `(code, message)`.
    fn error_for(effects: &[Effect], id: u64) -> (u16, String) {
        match effects {
            [
                Effect::Emit {
                    audience: Audience::Connection(c),
                    event: ServerEvent::Error { code, message },
                },
            ] if *c == cid(id) => (*code, message.clone()),
            other => panic!("expected one error for {id}, got {other:?}"),
        }
    }

    fn emitted_room(effects: &[Effect], audience: Audience) -> Option<&RoomInfo> {
        effects.iter().find_map(|e| match e {
            Effect::Emit {
                audience: a,
                event: ServerEvent::RoomUpdate(room) | ServerEvent::GameStarted(room),
            } if *a == audience => Some(room),
            _ => None,
        })
    }

    fn broadcasts_room_list(effects: &[Effect]) -> bool {
        effects.iter().any(|e| {
            matches!(
                e,
                Effect::Emit {
                    audience: Audience::Everyone,
                    event: ServerEvent::RoomListUpdate(_),
                }
            )
        })
    }

    // =====================================================================
    // register / getRooms
    // =====================================================================

    #[test]
    fn test_register_replies_with_room_list() {
        let mut lobby = lobby();

        let effects = register(&mut lobby, 1);

        assert_eq!(
            effects,
            vec![Effect::to(cid(1), ServerEvent::RoomListUpdate(vec![]))]
        );
        assert_eq!(lobby.sessions().len(), 1);
    }

    #[test]
    fn test_register_empty_nickname_accepted() {
        let mut lobby = lobby();

        let effects = lobby.handle(
            cid(1),
            ClientEvent::Register {
                nickname: "".into(),
                affiliation: "".into(),
                external_id: None,
            },
        );

        assert_eq!(
            effects,
            vec![Effect::to(cid(1), ServerEvent::RoomListUpdate(vec![]))]
        );
        assert_eq!(lobby.sessions().len(), 1);
        assert_eq!(lobby.sessions().get(cid(1)).unwrap().nickname, "");
    }

    #[test]
    fn test_reregister_in_room_updates_room() {
        let mut lobby = lobby();
        register(&mut lobby, 1);
        let room = create(&mut lobby, 1, 2);
        lobby.handle(cid(1), ClientEvent::ToggleReady);

        let effects = lobby.handle(
            cid(1),
            ClientEvent::Register {
                nickname: "neo".into(),
                affiliation: "Zion U".into(),
                external_id: Some("u-1".into()),
            },
        );

        let info = emitted_room(&effects, Audience::Room(room)).unwrap();
        assert_eq!(info.players[0].nickname, "neo");
        assert!(info.players[0].is_ready);
    }

    #[test]
    fn test_get_rooms_without_register_allowed() {
        let mut lobby = lobby();
        register(&mut lobby, 1);
        create(&mut lobby, 1, 2);

        let effects = lobby.handle(cid(2), ClientEvent::GetRooms);

        match effects.as_slice() {
            [
                Effect::Emit {
                    audience: Audience::Connection(c),
                    event: ServerEvent::RoomListUpdate(rooms),
                },
            ] => {
                assert_eq!(*c, cid(2));
                assert_eq!(rooms.len(), 1);
                assert_eq!(rooms[0].player_count, 1);
            }
            other => panic!("unexpected effects {other:?}"),
        }
    }

    // =====================================================================
    // createRoom / joinRoom
    // =====================================================================

    #[test]
    fn test_create_room_unregistered_is_401() {
        let mut lobby = lobby();

        let effects = lobby.handle(
            cid(1),
            ClientEvent::CreateRoom {
                room_name: "Alpha".into(),
                max_players: 2,
            },
        );

        assert_eq!(error_for(&effects, 1).0, 401);
        assert_eq!(lobby.rooms().room_count(), 0);
    }

    #[test]
    fn test_create_room_subscribes_then_announces() {
        let mut lobby = lobby();
        register(&mut lobby, 1);

        let effects = lobby.handle(
            cid(1),
            ClientEvent::CreateRoom {
                room_name: "Alpha".into(),
                max_players: 2,
            },
        );

        assert_eq!(
            effects[0],
            Effect::Subscribe {
                connection: cid(1),
                room: RoomId(1)
            }
        );
        assert!(matches!(
            &effects[1],
            Effect::Emit {
                audience: Audience::Connection(c),
                event: ServerEvent::RoomCreated(_),
            } if *c == cid(1)
        ));
        assert!(broadcasts_room_list(&effects));
    }

    #[test]
    fn test_create_room_zero_capacity_is_400() {
        let mut lobby = lobby();
        register(&mut lobby, 1);

        let effects = lobby.handle(
            cid(1),
            ClientEvent::CreateRoom {
                room_name: "Alpha".into(),
                max_players: 0,
            },
        );

        assert_eq!(error_for(&effects, 1).0, 400);
    }

    #[test]
    fn test_create_room_blank_name_accepted() {
        let mut lobby = lobby();
        register(&mut lobby, 1);

        let effects = lobby.handle(
            cid(1),
            ClientEvent::CreateRoom {
                room_name: "  ".into(),
                max_players: 2,
            },
        );

        assert!(matches!(
            &effects[1],
            Effect::Emit {
                event: ServerEvent::RoomCreated(room),
                ..
            } if room.name == "  "
        ));
        assert_eq!(lobby.rooms().room_count(), 1);
    }

    #[test]
    fn test_create_room_capacity_100_accepted() {
        let mut lobby = lobby();
        register(&mut lobby, 1);

        let room = create(&mut lobby, 1, 100);

        let info = lobby.rooms().room(room).unwrap();
        assert_eq!(info.max_players, 100);
    }

    #[test]
    fn test_join_room_notifies_joiner_room_and_everyone() {
        let mut lobby = lobby();
        register(&mut lobby, 1);
        register(&mut lobby, 2);
        let room = create(&mut lobby, 1, 2);

        let effects = lobby.handle(cid(2), ClientEvent::JoinRoom { room_id: room });

        assert_eq!(
            effects[0],
            Effect::Subscribe {
                connection: cid(2),
                room
            }
        );
        assert!(matches!(
            &effects[1],
            Effect::Emit {
                audience: Audience::Connection(c),
                event: ServerEvent::RoomJoined(info),
            } if *c == cid(2) && info.players.len() == 2
        ));
        assert!(emitted_room(&effects, Audience::Room(room)).is_some());
        assert!(broadcasts_room_list(&effects));
    }

    #[test]
    fn test_join_full_room_is_409() {
        let mut lobby = lobby();
        for id in 1..=2 {
            register(&mut lobby, id);
        }
        let room = create(&mut lobby, 1, 1);

        let effects = lobby.handle(cid(2), ClientEvent::JoinRoom { room_id: room });

        let (code, message) = error_for(&effects, 2);
        assert_eq!(code, 409);
        assert!(message.contains("full"));
    }

    #[test]
    fn test_join_missing_room_is_404() {
        let mut lobby = lobby();
        register(&mut lobby, 1);

        let effects =
            lobby.handle(cid(1), ClientEvent::JoinRoom { room_id: RoomId(9) });

        assert_eq!(error_for(&effects, 1).0, 404);
    }

    // =====================================================================
    // leaveRoom / disconnect
    // =====================================================================

    #[test]
    fn test_leave_room_not_in_room_is_silent() {
        let mut lobby = lobby();
        register(&mut lobby, 1);

        assert!(lobby.handle(cid(1), ClientEvent::LeaveRoom).is_empty());
    }

    #[test]
    fn test_leave_room_with_remaining_members() {
        let mut lobby = lobby();
        register(&mut lobby, 1);
        register(&mut lobby, 2);
        let room = create(&mut lobby, 1, 2);
        lobby.handle(cid(2), ClientEvent::JoinRoom { room_id: room });

        let effects = lobby.handle(cid(1), ClientEvent::LeaveRoom);

        assert_eq!(
            effects[0],
            Effect::Unsubscribe {
                connection: cid(1),
                room
            }
        );
        let remaining = emitted_room(&effects, Audience::Room(room)).unwrap();
        assert_eq!(remaining.players.len(), 1);
        assert!(broadcasts_room_list(&effects));
        assert_eq!(
            effects.last(),
            Some(&Effect::to(cid(1), ServerEvent::LeftRoom))
        );
    }

    #[test]
    fn test_leave_room_last_member_deletes_room() {
        let mut lobby = lobby();
        register(&mut lobby, 1);
        let room = create(&mut lobby, 1, 2);

        let effects = lobby.handle(cid(1), ClientEvent::LeaveRoom);

        assert!(emitted_room(&effects, Audience::Room(room)).is_none());
        assert!(effects.contains(&Effect::to_everyone(
            ServerEvent::RoomListUpdate(vec![])
        )));
        assert_eq!(lobby.rooms().room_count(), 0);
    }

    #[test]
    fn test_disconnect_sole_member_removes_room_and_session() {
        let mut lobby = lobby();
        register(&mut lobby, 1);
        let room = create(&mut lobby, 1, 2);

        let effects = lobby.disconnect(cid(1));

        assert_eq!(
            effects[0],
            Effect::Unsubscribe {
                connection: cid(1),
                room
            }
        );
        assert!(!effects.contains(&Effect::to(cid(1), ServerEvent::LeftRoom)));
        assert_eq!(lobby.rooms().player_room(cid(1)), None);
        assert_eq!(lobby.rooms().list_rooms().count(), 0);
        assert!(lobby.sessions().get(cid(1)).is_none());
    }

    #[test]
    fn test_disconnect_outside_room_emits_nothing() {
        let mut lobby = lobby();
        register(&mut lobby, 1);

        assert!(lobby.disconnect(cid(1)).is_empty());
        assert!(lobby.sessions().is_empty());
    }

    // =====================================================================
    // toggleReady / startGame / move
    // =====================================================================

    #[test]
    fn test_full_start_flow() {
        let mut lobby = lobby();
        register(&mut lobby, 1);
        register(&mut lobby, 2);
        let room = create(&mut lobby, 1, 2);
        lobby.handle(cid(2), ClientEvent::JoinRoom { room_id: room });

        let effects = lobby.handle(cid(1), ClientEvent::ToggleReady);
        assert!(emitted_room(&effects, Audience::Room(room)).is_some());
        assert!(broadcasts_room_list(&effects));

        let effects = lobby.handle(cid(1), ClientEvent::StartGame);
        assert_eq!(error_for(&effects, 1).0, 409);

        lobby.handle(cid(2), ClientEvent::ToggleReady);
        let effects = lobby.handle(cid(2), ClientEvent::StartGame);

        let started = emitted_room(&effects, Audience::Room(room)).unwrap();
        assert_eq!(started.status, RoomStatus::Started);
        assert!(matches!(
            &effects[0],
            Effect::Emit {
                event: ServerEvent::GameStarted(_),
                ..
            }
        ));
        assert!(broadcasts_room_list(&effects));
    }

    #[test]
    fn test_toggle_ready_not_in_room_is_404() {
        let mut lobby = lobby();
        register(&mut lobby, 1);

        let effects = lobby.handle(cid(1), ClientEvent::ToggleReady);

        assert_eq!(error_for(&effects, 1).0, 404);
    }

    #[test]
    fn test_move_relays_to_rest_of_room() {
        let mut lobby = lobby();
        register(&mut lobby, 1);
        register(&mut lobby, 2);
        let room = create(&mut lobby, 1, 2);
        lobby.handle(cid(2), ClientEvent::JoinRoom { room_id: room });

        let effects = lobby.handle(cid(1), ClientEvent::Move { x: 3.0, y: 4.5 });

        assert_eq!(
            effects,
            vec![Effect::Emit {
                audience: Audience::RoomExcept(room, cid(1)),
                event: ServerEvent::PlayerMoved {
                    id: cid(1),
                    x: 3.0,
                    y: 4.5
                },
            }]
        );
    }

    #[test]
    fn test_move_outside_room_is_dropped() {
        let mut lobby = lobby();
        register(&mut lobby, 1);

        assert!(lobby.handle(cid(1), ClientEvent::Move { x: 0.0, y: 0.0 }).is_empty());
    }

    // =====================================================================
    // health
    // =====================================================================

    #[test]
    fn test_status_counts_rooms_and_sessions() {
        let mut lobby = lobby();
        for id in 1..=3 {
            register(&mut lobby, id);
        }
        create(&mut lobby, 1, 2);

        let status = lobby.status();

        assert_eq!(status.status, "ok");
        assert_eq!(status.rooms, 1);
        assert_eq!(status.sessions, 3);
    }

    #[test]
    fn test_health_answers_only_the_sender() {
        let mut lobby = lobby();
        register(&mut lobby, 1);
        create(&mut lobby, 1, 2);

        // Unregistered connections may ask too.
        let effects = lobby.handle(cid(2), ClientEvent::Health);

        match effects.as_slice() {
            [
                Effect::Emit {
                    audience: Audience::Connection(c),
                    event: ServerEvent::Health(report),
                },
            ] => {
                assert_eq!(*c, cid(2));
                assert_eq!((report.rooms, report.sessions), (1, 1));
            }
            other => panic!("unexpected effects {other:?}"),
        }
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut lobby = lobby();
        register(&mut lobby, 1);
        create(&mut lobby, 1, 2);

        lobby.clear();

        assert!(lobby.sessions().is_empty());
        assert_eq!(lobby.rooms().room_count(), 0);
    }
}
