//! Sockets for Doodle.
//!
//! Rooms and handlers never see a socket type. They see a [`Connection`]
//! yielding [`Frame`]s, which can be answered with text or with raw bytes,
//! and a [`Transport`] that produces connections.
//!
//! Two kinds of payload cross this layer:
//!
//! ```text
//! Frame::Text    JSON protocol message  (join, guess, heartbeat, state ...)
//! Frame::Binary  drawing buffer         (relayed as is, never re-encoded)
//! ```
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WebSocketTransport`] over `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static CONNECTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Identifies one accepted socket for as long as the process runs.
///
/// A player id can be reused by a reconnecting client, a `ConnectionId`
/// never is. Rooms key roster entries by it so that a late disconnect from
/// a dead socket cannot evict the player's newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Allocates a fresh id, distinct from every id handed out before.
    pub fn next() -> Self {
        Self(CONNECTION_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// One inbound message from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Produces connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client and completes its handshake.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A connected client.
///
/// Sending and receiving take `&self` so one task can wait on
/// [`recv`](Self::recv) while another branch of the same `select!` sends.
/// A clean close and an abrupt drop both end the connection: `recv` yields
/// `Ok(None)` for the first and an error for the second.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send_text(&self, text: &str) -> Result<(), Self::Error>;

    async fn send_binary(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Next text or binary frame. Control frames are skipped.
    async fn recv(&self) -> Result<Option<Frame>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
