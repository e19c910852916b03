//! Unified error type for the Doodle server.

use doodle_clue::ClueError;
use doodle_protocol::ProtocolError;
use doodle_room::{RoomError, TelemetryError};
use doodle_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DoodleError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The clue corpus could not be loaded.
    #[error(transparent)]
    Clue(#[from] ClueError),

    /// A room-level error (unknown room, duplicate player, ...).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The telemetry exporter could not be set up.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}
