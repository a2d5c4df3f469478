//! The session registry: which connection is in which room.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is not thread-safe by itself; it uses plain
//! `HashMap`s. The server wraps it in a `tokio::sync::Mutex`, so room
//! creation, lookup and removal are serialized, and a room is shut down
//! and forgotten inside the same critical section that saw its last
//! player leave.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use snatch_protocol::{Command, PlayerId, RoomId, RoomSnapshot};
use snatch_room::{
    Dictionary, GameConfig, LengthScoring, PlayerSender, Room, RoomError,
    RoomHandle, RoomInfo, Scoring, spawn_room,
};

use crate::SessionError;

/// Where a connection is seated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub nickname: String,
    pub room_id: RoomId,
}

/// Maps connections to rooms and owns every room handle.
///
/// ```text
/// join_room() ──→ [bound] ──→ leave_room() ──→ [unbound]
///     │               │              │
///     ▼               ▼              ▼ (last active player)
/// room created   route_command   room shut down + removed
/// if absent      route_chat
/// ```
pub struct SessionRegistry {
    config: GameConfig,
    dictionary: Arc<dyn Dictionary>,
    scoring: Arc<dyn Scoring>,
    /// Bound connections. Every `room_id` here is a key of `rooms`.
    players: HashMap<PlayerId, Binding>,
    rooms: HashMap<RoomId, RoomHandle>,
}

impl SessionRegistry {
    /// An empty registry. Rooms it creates use `config` and `dictionary`.
    pub fn new(config: GameConfig, dictionary: Arc<dyn Dictionary>) -> Self {
        Self {
            config,
            dictionary,
            scoring: Arc::new(LengthScoring),
            players: HashMap::new(),
            rooms: HashMap::new(),
        }
    }

    /// Replaces the scoring policy for rooms created from now on.
    pub fn with_scoring(mut self, scoring: Arc<dyn Scoring>) -> Self {
        self.scoring = scoring;
        self
    }

    /// Seats `player_id` in a room and returns the room id and whether it
    /// is private.
    ///
    /// - No room (or an empty name) creates a fresh private room.
    /// - A connection that is already seated is routed back to its current
    ///   room whatever it asked for; the room re-activates the seat and
    ///   takes the new nickname and sender.
    /// - Otherwise the named room is created if it doesn't exist.
    ///
    /// # Errors
    /// Returns [`SessionError::Room`] if the room actor is gone.
    pub async fn join_room(
        &mut self,
        player_id: PlayerId,
        nickname: &str,
        room: Option<RoomId>,
        sender: PlayerSender,
    ) -> Result<(RoomId, bool), SessionError> {
        if let Some(binding) = self.players.get(&player_id) {
            let room_id = binding.room_id.clone();
            let handle = self
                .rooms
                .get(&room_id)
                .cloned()
                .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
            handle.join(player_id, nickname, sender).await?;
            if let Some(binding) = self.players.get_mut(&player_id) {
                binding.nickname = nickname.to_string();
            }
            tracing::debug!(
                %player_id, %room_id, "repeated join routed to current room"
            );
            return Ok((room_id, handle.is_private()));
        }

        let requested = room.filter(|id| !id.as_str().trim().is_empty());
        let handle = match requested {
            Some(room_id) => match self.rooms.get(&room_id) {
                Some(handle) => handle.clone(),
                None => self.create_room(room_id, false),
            },
            None => {
                let room_id = self.private_room_id();
                self.create_room(room_id, true)
            }
        };

        let room_id = handle.room_id().clone();
        handle.join(player_id, nickname, sender).await?;
        self.players.insert(
            player_id,
            Binding {
                nickname: nickname.to_string(),
                room_id: room_id.clone(),
            },
        );
        tracing::info!(%player_id, %room_id, nickname, "player bound to room");
        Ok((room_id, handle.is_private()))
    }

    /// Takes `player_id` out of its room and forgets the binding. Shuts
    /// the room down if nobody active is left. Returns the room left.
    ///
    /// The binding is erased here rather than in
    /// [`remove_player`](Self::remove_player): a binding to a room that was
    /// just shut down would point at nothing, and erasing it lets the same
    /// connection join a different room afterwards.
    ///
    /// # Errors
    /// Returns [`SessionError::NotRegistered`] if the player is not seated.
    pub async fn leave_room(
        &mut self,
        player_id: PlayerId,
    ) -> Result<RoomId, SessionError> {
        let Binding { room_id, .. } = self
            .players
            .remove(&player_id)
            .ok_or(SessionError::NotRegistered(player_id))?;

        let Some(handle) = self.rooms.get(&room_id).cloned() else {
            tracing::warn!(
                %player_id, %room_id, "binding pointed at a missing room"
            );
            return Ok(room_id);
        };

        let remaining = match handle.leave(player_id).await {
            Ok(remaining) => remaining,
            Err(RoomError::Unavailable(_)) => {
                tracing::warn!(%room_id, "room actor gone, removing room");
                0
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(%player_id, %room_id, remaining, "player left room");

        if remaining == 0 {
            self.close_room(&room_id).await;
        }
        Ok(room_id)
    }

    /// Disconnect cleanup: [`leave_room`](Self::leave_room) if seated,
    /// nothing otherwise. Since `leave_room` already erases the binding,
    /// there is nothing left to forget afterwards.
    pub async fn remove_player(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(), SessionError> {
        match self.leave_room(player_id).await {
            Ok(_) | Err(SessionError::NotRegistered(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// A handle to the sender's room, detached from the registry.
    ///
    /// Callers that share the registry behind a lock should resolve the
    /// handle, release the lock, then send: a full room queue then only
    /// holds up that room's players.
    pub fn room_handle_for(
        &self,
        player_id: PlayerId,
    ) -> Result<RoomHandle, SessionError> {
        self.handle_for(player_id).cloned()
    }

    /// Forwards a game command to the sender's room.
    pub async fn route_command(
        &self,
        player_id: PlayerId,
        command: Command,
    ) -> Result<(), SessionError> {
        let handle = self.room_handle_for(player_id)?;
        Ok(handle.send_command(player_id, command).await?)
    }

    /// Forwards a chat line to the sender's room.
    pub async fn route_chat(
        &self,
        player_id: PlayerId,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        let handle = self.room_handle_for(player_id)?;
        Ok(handle.send_chat(player_id, text).await?)
    }

    /// Metadata of a room.
    pub async fn room_info(
        &self,
        room_id: &RoomId,
    ) -> Result<RoomInfo, SessionError> {
        Ok(self.handle(room_id)?.info().await?)
    }

    /// The full visible state of a room.
    pub async fn room_snapshot(
        &self,
        room_id: &RoomId,
    ) -> Result<RoomSnapshot, SessionError> {
        Ok(self.handle(room_id)?.snapshot().await?)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// The room a connection is seated in, if any.
    pub fn player_room(&self, player_id: PlayerId) -> Option<&RoomId> {
        self.players.get(&player_id).map(|b| &b.room_id)
    }

    pub fn binding(&self, player_id: PlayerId) -> Option<&Binding> {
        self.players.get(&player_id)
    }

    /// Shuts every room down and forgets all bindings.
    pub async fn shutdown(&mut self) {
        for (room_id, handle) in self.rooms.drain() {
            if handle.shutdown().await.is_err() {
                tracing::debug!(%room_id, "room already stopped");
            }
        }
        self.players.clear();
        tracing::info!("all rooms shut down");
    }

    // -- internals ----------------------------------------------------------

    fn handle(&self, room_id: &RoomId) -> Result<&RoomHandle, SessionError> {
        self.rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()).into())
    }

    fn handle_for(
        &self,
        player_id: PlayerId,
    ) -> Result<&RoomHandle, SessionError> {
        let room_id = self
            .player_room(player_id)
            .ok_or(SessionError::NotRegistered(player_id))?;
        self.handle(room_id)
    }

    fn create_room(&mut self, room_id: RoomId, private: bool) -> RoomHandle {
        let room = Room::new(
            room_id.clone(),
            private,
            self.config.clone(),
            Arc::clone(&self.dictionary),
        )
        .with_scoring(Arc::clone(&self.scoring));
        let handle = spawn_room(room);
        self.rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(
            %room_id, private, rooms = self.rooms.len(), "room created"
        );
        handle
    }

    async fn close_room(&mut self, room_id: &RoomId) {
        if let Some(handle) = self.rooms.remove(room_id) {
            let _ = handle.shutdown().await;
            tracing::info!(
                %room_id, rooms = self.rooms.len(), "room destroyed"
            );
        }
    }

    /// A fresh private room id that no live room uses.
    fn private_room_id(&self) -> RoomId {
        loop {
            let id = RoomId(generate_room_token());
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

/// 20 random bytes as 40 lower-case hex characters.
fn generate_room_token() -> String {
    let bytes: [u8; 20] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
