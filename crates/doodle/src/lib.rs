//! # Doodle
//!
//! A room-scoped drawing-and-guessing game server.
//!
//! Players connect over WebSocket and join a room by id. Once two players
//! are in, one of them (the drawer) gets a secret clue and streams a
//! drawing; everyone else guesses. A correct guess or the turn deadline
//! passes the turn to the next player in join order.
//!
//! This crate ties the layers together:
//!
//! - [`DoodleServer`] - builder and accept loop
//! - [`ServerConfig`] - settings, read from the environment
//! - [`HttpTelemetry`] / [`ServerTelemetry`] - POSTs room events to a
//!   collector
//! - [`DoodleError`] - one error type over every layer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use doodle::prelude::*;
//!
//! # async fn start() -> Result<(), DoodleError> {
//! let config = ServerConfig::from_env();
//! let corpus = ClueCorpus::load(&config.clue_dir, &config.locale)?;
//! let telemetry = ServerTelemetry::from_url(config.export_url.as_deref())?;
//! let server = DoodleServer::builder()
//!     .config(config)
//!     .telemetry(telemetry)
//!     .build(Arc::new(corpus))
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;
mod telemetry;

pub use config::ServerConfig;
pub use error::DoodleError;
pub use server::{DoodleServer, DoodleServerBuilder, SharedRegistry};
pub use telemetry::{HttpTelemetry, ServerTelemetry, ROOM_STATUS_PATH, TIMEOUT_PATH};

/// Everything needed to run a server and talk to its rooms.
pub mod prelude {
    pub use crate::{
        DoodleError, DoodleServer, DoodleServerBuilder, HttpTelemetry, ServerConfig,
        ServerTelemetry, SharedRegistry,
    };
    pub use doodle_clue::{ClueCorpus, GuessScorer};
    pub use doodle_protocol::{
        ClientMessage, Clue, Codec, GuessResult, GuessStatus, JsonCodec, PlayerGuess, PlayerId,
        RoomId, RoomView, ServerMessage, PROTOCOL_VERSION,
    };
    pub use doodle_room::{
        NoopTelemetry, OverallStats, RoomConfig, RoomError, RoomRegistry, RoomStats, Telemetry,
    };
}
