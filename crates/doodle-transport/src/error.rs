use std::io;

/// Failures below the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not bind listener: {0}")]
    BindFailed(#[source] io::Error),

    #[error("could not accept tcp stream: {0}")]
    AcceptFailed(#[source] io::Error),

    /// The client did not complete the WebSocket upgrade.
    #[error("websocket upgrade failed: {0}")]
    HandshakeFailed(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    /// Abrupt disconnect or a protocol violation on the wire.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Closing handshake failed; the peer is already gone.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
}
