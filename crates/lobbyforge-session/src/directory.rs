//! The session directory: which player is behind which connection.
//!
//! # Concurrency note
//!
//! `SessionDirectory` is a plain `HashMap` and takes `&mut self` for every
//! mutation. It is owned by the lobby coordinator, which sits behind the
//! server's single lock together with the room registry, so a directory
//! change and the room change that goes with it are observed together.

use std::collections::HashMap;
use std::sync::Arc;

use lobbyforge_protocol::ConnectionId;

use crate::{PlayerProfile, SessionError};

/// Maps live connections to the player profile they registered.
///
/// ```text
/// register() ──→ [registered] ──register()──→ [registered, new profile]
///                      │
///                   remove()
///                      ▼
///               [unknown connection]
/// ```
#[derive(Debug, Default)]
pub struct SessionDirectory {
    players: HashMap<ConnectionId, Arc<PlayerProfile>>,
}

impl SessionDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a player profile to `id`, replacing any previous one.
    ///
    /// Never fails. The returned `Arc` is the same one stored in the
    /// directory, so callers can hand it to the room registry without
    /// copying the profile.
    pub fn register(
        &mut self,
        id: ConnectionId,
        nickname: impl Into<String>,
        affiliation: impl Into<String>,
        external_id: Option<String>,
    ) -> Arc<PlayerProfile> {
        let profile = Arc::new(PlayerProfile {
            id,
            nickname: nickname.into(),
            affiliation: affiliation.into(),
            external_id,
        });

        let replaced = self.players.insert(id, Arc::clone(&profile)).is_some();
        tracing::info!(
            connection = %id,
            nickname = %profile.nickname,
            replaced,
            "player registered"
        );

        profile
    }

    /// Looks up the profile bound to `id`.
    pub fn get(&self, id: ConnectionId) -> Option<Arc<PlayerProfile>> {
        self.players.get(&id).cloned()
    }

    /// Like [`get`](Self::get), but a missing entry is an error.
    ///
    /// # Errors
    /// Returns [`SessionError::NotRegistered`] if `id` never registered.
    pub fn require(
        &self,
        id: ConnectionId,
    ) -> Result<Arc<PlayerProfile>, SessionError> {
        self.get(id).ok_or(SessionError::NotRegistered(id))
    }

    /// Drops the binding for `id` and returns the profile it held.
    ///
    /// Room membership is not touched here. Callers remove the player
    /// from its room in the same critical section.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Arc<PlayerProfile>> {
        let removed = self.players.remove(&id);
        if removed.is_some() {
            tracing::debug!(connection = %id, "player removed from directory");
        }
        removed
    }

    /// Returns the number of registered players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Returns `true` if no player is registered.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Forgets every player. Used on shutdown.
    pub fn clear(&mut self) {
        self.players.clear();
    }
}

// =========================================================================
// Tests
// =========================================================================
