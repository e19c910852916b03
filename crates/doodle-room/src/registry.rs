//! Room registry: creates, tracks, and routes connections to rooms.

use std::collections::HashMap;
use std::sync::Arc;

use doodle_clue::ClueCorpus;
use doodle_protocol::{GuessResult, Player, PlayerGuess, PlayerId, RoomId};
use doodle_transport::ConnectionId;
use serde::Serialize;

use crate::room::spawn_room;
use crate::telemetry::{NoopTelemetry, Telemetry};
use crate::{PlayerSender, RoomConfig, RoomError, RoomHandle, RoomStats};

/// Room count and ids across the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub room_count: usize,
    pub room_ids: Vec<RoomId>,
}

/// Owns every room and remembers which room each connection joined.
///
/// This is the entry point for room operations from the server layer and
/// from admin callers. It holds handles only; all game state lives in the
/// room actors.
pub struct RoomRegistry<T: Telemetry = NoopTelemetry> {
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each live connection to the room and player it is bound to.
    connections: HashMap<ConnectionId, (RoomId, PlayerId)>,

    config: RoomConfig,
    corpus: Arc<ClueCorpus>,
    telemetry: Arc<T>,

    /// Create unknown rooms on first connect instead of rejecting them.
    auto_create: bool,
}

impl RoomRegistry<NoopTelemetry> {
    /// A registry that reports nothing.
    pub fn new(config: RoomConfig, corpus: Arc<ClueCorpus>) -> Self {
        Self::with_telemetry(config, corpus, Arc::new(NoopTelemetry))
    }
}

impl<T: Telemetry> RoomRegistry<T> {
    pub fn with_telemetry(config: RoomConfig, corpus: Arc<ClueCorpus>, telemetry: Arc<T>) -> Self {
        Self {
            rooms: HashMap::new(),
            connections: HashMap::new(),
            config: config.validated(),
            corpus,
            telemetry,
            auto_create: false,
        }
    }

    /// Whether [`connect`](Self::connect) creates rooms it does not know.
    pub fn with_auto_create(mut self, auto_create: bool) -> Self {
        self.auto_create = auto_create;
        self
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    // -- Room lifecycle ----------------------------------------------------

    /// Creates and starts an empty room.
    pub fn create_room(&mut self, room_id: RoomId) -> Result<RoomHandle, RoomError> {
        if self.rooms.contains_key(&room_id) {
            return Err(RoomError::RoomIdAlreadyInUse(room_id));
        }
        Ok(self.spawn(room_id))
    }

    pub fn get_room(&self, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NoRoomWithThisId(room_id.clone()))
    }

    pub fn get_or_create_room(&mut self, room_id: RoomId) -> RoomHandle {
        match self.rooms.get(&room_id) {
            Some(handle) => handle.clone(),
            None => self.spawn(room_id),
        }
    }

    /// Shuts a room down and forgets its connections. Their handlers see
    /// their outbound channel close.
    pub async fn delete_room(&mut self, room_id: &RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(room_id)
            .ok_or_else(|| RoomError::NoRoomWithThisId(room_id.clone()))?;

        let _ = handle.shutdown().await;
        self.connections.retain(|_, (rid, _)| rid != room_id);

        tracing::info!(%room_id, "room deleted");
        Ok(())
    }

    /// Deletes every room.
    pub async fn shutdown(&mut self) {
        let ids: Vec<RoomId> = self.rooms.keys().cloned().collect();
        for room_id in ids {
            let _ = self.delete_room(&room_id).await;
        }
    }

    fn spawn(&mut self, room_id: RoomId) -> RoomHandle {
        let handle = spawn_room(
            room_id.clone(),
            &self.config,
            Arc::clone(&self.corpus),
            Arc::clone(&self.telemetry),
        );
        self.rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, "room created");
        handle
    }

    // -- Connections -------------------------------------------------------

    /// Binds `player` to `connection` in `room_id` and returns the room's
    /// handle so the caller can talk to it directly.
    ///
    /// Waits for the room actor while holding `&mut self`. Callers that
    /// share the registry behind a lock should use
    /// [`room_for_join`](Self::room_for_join) and
    /// [`bind_connection`](Self::bind_connection) around their own
    /// [`RoomHandle::connect`] instead.
    pub async fn connect(
        &mut self,
        room_id: &RoomId,
        player: Player,
        connection: ConnectionId,
        sender: PlayerSender,
    ) -> Result<RoomHandle, RoomError> {
        let handle = self.room_for_join(room_id)?;
        let player_id = player.id.clone();
        handle.connect(connection, player, sender).await?;
        self.bind_connection(connection, room_id.clone(), player_id);
        Ok(handle)
    }

    /// The room a join for `room_id` goes to: the existing one, a new one
    /// when auto-create is on, or `NoRoomWithThisId`.
    pub fn room_for_join(&mut self, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
        if self.auto_create {
            Ok(self.get_or_create_room(room_id.clone()))
        } else {
            self.get_room(room_id)
        }
    }

    /// Records that `connection` is bound to `player_id` in `room_id`.
    pub fn bind_connection(&mut self, connection: ConnectionId, room_id: RoomId, player_id: PlayerId) {
        self.connections.insert(connection, (room_id, player_id));
    }

    /// Forgets `connection` and returns the handle of the room it was
    /// bound to, if that room still exists.
    pub fn unbind_connection(&mut self, connection: ConnectionId) -> Option<RoomHandle> {
        let (room_id, _) = self.connections.remove(&connection)?;
        self.rooms.get(&room_id).cloned()
    }

    /// Unbinds `connection`. Returns the player that was removed, or `None`
    /// if the connection was unknown or its player had already been
    /// replaced or dropped.
    pub async fn disconnect(
        &mut self,
        connection: ConnectionId,
    ) -> Result<Option<(RoomId, PlayerId)>, RoomError> {
        let Some(handle) = self.unbind_connection(connection) else {
            return Ok(None);
        };
        let removed = handle.disconnect(connection).await?;
        Ok(removed.map(|player_id| (handle.room_id().clone(), player_id)))
    }

    /// The room and player a connection is bound to.
    pub fn connection(&self, connection: ConnectionId) -> Option<&(RoomId, PlayerId)> {
        self.connections.get(&connection)
    }

    /// Removes a player from a room by id.
    pub async fn remove_player(&mut self, room_id: &RoomId, player_id: &PlayerId) -> Result<(), RoomError> {
        self.get_room(room_id)?.remove_player(player_id.clone()).await?;
        self.connections
            .retain(|_, (rid, pid)| !(rid == room_id && pid == player_id));
        Ok(())
    }

    // -- Game operations ---------------------------------------------------

    pub async fn submit_guess(&self, guess: PlayerGuess) -> Result<GuessResult, RoomError> {
        self.get_room(&guess.room_id)?
            .guess(guess.player_id, guess.message)
            .await
    }

    pub async fn update_drawing(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
        data: Vec<u8>,
    ) -> Result<(), RoomError> {
        self.get_room(room_id)?.draw(player_id, data).await
    }

    pub async fn start_game(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.get_room(room_id)?.start().await
    }

    pub async fn restart_game(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.get_room(room_id)?.restart().await
    }

    pub async fn end_game(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.get_room(room_id)?.end().await
    }

    /// Ends the game in every room. Rooms that fail to answer are skipped.
    pub async fn end_all_games(&self) {
        for handle in self.rooms.values() {
            if let Err(err) = handle.end().await {
                tracing::warn!(room_id = %handle.room_id(), error = %err, "could not end game");
            }
        }
    }

    // -- Introspection -----------------------------------------------------

    pub async fn room_stats(&self, room_id: &RoomId) -> Result<RoomStats, RoomError> {
        self.get_room(room_id)?.stats().await
    }

    pub fn overall_stats(&self) -> OverallStats {
        OverallStats {
            room_count: self.room_count(),
            room_ids: self.room_ids(),
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// All room ids, sorted.
    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.keys().cloned().collect();
        ids.sort();
        ids
    }
}
