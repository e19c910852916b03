//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, unknown `type` tag, or a
    /// missing required field.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but breaks a protocol rule (for example a join
    /// with the wrong protocol version).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
