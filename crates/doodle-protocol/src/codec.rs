//! Codec trait and implementations for text-frame messages.
//!
//! Protocol messages ride in text frames, so a codec maps Rust types to and
//! from `String`. Binary frames (the drawing buffer) bypass the codec.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts protocol messages to and from text.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task on the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text payload.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text payload.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed or does not
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use doodle_protocol::{ClientMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg = ClientMessage::Guess { message: "kot".into() };
///
/// let text = codec.encode(&msg).unwrap();
/// assert_eq!(text, r#"{"type":"guess","message":"kot"}"#);
///
/// let decoded: ClientMessage = codec.decode(&text).unwrap();
/// assert_eq!(decoded, msg);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
