//! Client and server messages carried in text frames.
//!
//! Both enums are internally tagged: `{"type": "guess", "message": "kot"}`.
//! Binary frames are not represented here; they are always a drawing
//! buffer.

use serde::{Deserialize, Serialize};

use crate::{Clue, PlayerId, RoomId, RoomView};

/// The protocol version clients must send in [`ClientMessage::Join`].
pub const PROTOCOL_VERSION: u32 = 1;

/// Client → server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Must be the first frame. The player id is trusted as-is.
    Join {
        version: u32,
        room_id: RoomId,
        player_id: PlayerId,
        #[serde(default)]
        nick: Option<String>,
    },

    /// A guess at the current clue. Answered with
    /// [`ServerMessage::GuessResult`] or an error.
    Guess { message: String },

    /// Keep-alive; echoed back with the server's clock.
    ///
    /// The idle timer only counts frames from the client. A player who is
    /// just watching must still send a heartbeat more often than the
    /// server's idle timeout (60 s by default), or the connection is
    /// closed and the player leaves the room.
    Heartbeat { client_time: u64 },

    /// Graceful leave. Same effect on the room as closing the socket.
    Leave,
}

/// Server → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The join was accepted.
    Joined { room_id: RoomId, player_id: PlayerId },

    /// A fresh projection of the room for this connection.
    State { view: RoomView },

    /// The outcome of this connection's own guess.
    GuessResult(GuessResult),

    HeartbeatAck { client_time: u64, server_time: u64 },

    /// A client-visible failure. `code` follows HTTP conventions, see
    /// [`ErrorCode`].
    Error { code: u16, message: String },
}

/// Error codes used in [`ServerMessage::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    /// Malformed message or wrong protocol version.
    BadRequest = 400,
    /// No room with the requested id.
    NotFound = 404,
    /// Player id already bound in the room, or room id already in use.
    Conflict = 409,
    /// Guess submitted while the room is waiting for players.
    GameNotStarted = 412,
    /// The room task is gone.
    Unavailable = 503,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// How a guess scored against the clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuessStatus {
    Win,
    IsClose,
    Miss,
}

/// Response to a guess. `clue`, `winner` and `drawer` are only present on
/// [`GuessStatus::Win`], once the round is over and the word is no longer
/// secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessResult {
    pub status: GuessStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clue: Option<Clue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawer: Option<PlayerId>,
}

impl GuessResult {
    pub fn win(clue: Clue, winner: PlayerId, drawer: PlayerId) -> Self {
        Self {
            status: GuessStatus::Win,
            clue: Some(clue),
            winner: Some(winner),
            drawer: Some(drawer),
        }
    }

    pub fn is_close() -> Self {
        Self::bare(GuessStatus::IsClose)
    }

    pub fn miss() -> Self {
        Self::bare(GuessStatus::Miss)
    }

    fn bare(status: GuessStatus) -> Self {
        Self {
            status,
            clue: None,
            winner: None,
            drawer: None,
        }
    }
}

/// A guess addressed to a room, e.g. from an HTTP front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerGuess {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub message: String,
}
