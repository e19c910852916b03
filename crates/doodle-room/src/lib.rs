//! Rooms for Doodle.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! roster, turn, clue, drawing buffer and turn timer. Nothing outside the
//! task touches that state; callers send commands through a
//! [`RoomHandle`] and receive per-viewer projections on their
//! [`PlayerSender`] channel.
//!
//! # Key types
//!
//! - [`RoomRegistry`] - creates/deletes rooms, routes connections
//! - [`RoomHandle`] - send commands to a running room actor
//! - [`RoomPhase`] - waiting or active
//! - [`RoomConfig`] - activation threshold, turn length, guess threshold
//! - [`Telemetry`] - where rooms report roster changes and timeouts

mod config;
mod error;
mod projection;
mod registry;
mod room;
mod state;
mod telemetry;

pub use config::{RoomConfig, RoomPhase};
pub use error::RoomError;
pub use registry::{OverallStats, RoomRegistry};
pub use room::{PlayerSender, RoomHandle, RoomOutbound};
pub use state::RoomStats;
pub use telemetry::{
    NoopTelemetry, RoomStatusReport, Telemetry, TelemetryError, TelemetryEvent, TimeoutReport,
};
