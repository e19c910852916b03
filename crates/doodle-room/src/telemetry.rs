//! Outbound telemetry seam.
//!
//! Rooms report two kinds of events to an external collector: roster or
//! turn-holder changes, and turns that ran out of time. Delivery is best
//! effort. Each report runs on its own task so a slow or failing collector
//! never holds up a room, and failures only produce a warning.

use std::future::Future;

use doodle_protocol::{PlayerId, RoomId};
use serde::Serialize;

/// Who is in a room and who is drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatusReport {
    pub room_id: RoomId,
    pub active_players: Vec<PlayerId>,
    pub current_drawer: Option<PlayerId>,
}

/// A turn that ended because nobody guessed in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutReport {
    pub room_id: RoomId,
    /// The word that went unguessed.
    pub clue: String,
}

/// An event a room hands to its [`Telemetry`] sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    RoomStatus(RoomStatusReport),
    Timeout(TimeoutReport),
}

impl TelemetryEvent {
    pub fn room_id(&self) -> &RoomId {
        match self {
            Self::RoomStatus(report) => &report.room_id,
            Self::Timeout(report) => &report.room_id,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoomStatus(_) => "room_status",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// Why a report was not delivered.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The collector could not be reached.
    #[error("telemetry request failed: {0}")]
    Request(String),

    /// The collector answered with a non-success status.
    #[error("telemetry collector returned status {0}")]
    Status(u16),
}

/// Receives room events.
///
/// Implementations must be cheap to share: a registry holds one behind an
/// `Arc` and hands it to every room.
pub trait Telemetry: Send + Sync + 'static {
    fn report(
        &self,
        event: TelemetryEvent,
    ) -> impl Future<Output = Result<(), TelemetryError>> + Send;
}

/// Drops every event. Used when no collector is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    async fn report(&self, _event: TelemetryEvent) -> Result<(), TelemetryError> {
        Ok(())
    }
}
