//! Error types for the room layer.

use doodle_protocol::{ErrorCode, PlayerId, RoomId};

/// Errors that can occur during room operations.
///
/// Every variant is returned before the room is mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// A room with this id already exists.
    #[error("room id {0} already in use")]
    RoomIdAlreadyInUse(RoomId),

    /// The room does not exist.
    #[error("no room with id {0}")]
    NoRoomWithThisId(RoomId),

    /// The player id is already bound in this room.
    #[error("player id {0} already in use in room {1}")]
    PlayerIdAlreadyInUse(PlayerId, RoomId),

    /// The player is not in this room.
    #[error("no player with id {0} in room {1}")]
    NoPlayerWithThisId(PlayerId, RoomId),

    /// A guess arrived while the room is waiting for players.
    #[error("the game in room {0} is not started")]
    GameNotStarted(RoomId),

    /// A start or restart was requested with fewer than two players.
    #[error("room {room_id} has {players} player(s); at least 2 are needed")]
    NotEnoughPlayers { room_id: RoomId, players: usize },

    /// The room's task is gone (deleted while the request was in flight).
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// The client-visible error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoRoomWithThisId(_) | Self::NoPlayerWithThisId(..) => ErrorCode::NotFound,
            Self::RoomIdAlreadyInUse(_) | Self::PlayerIdAlreadyInUse(..) => ErrorCode::Conflict,
            Self::GameNotStarted(_) | Self::NotEnoughPlayers { .. } => ErrorCode::GameNotStarted,
            Self::Unavailable(_) => ErrorCode::Unavailable,
        }
    }
}
