//! Converting messages to and from bytes.
//!
//! The gateway only talks to a [`Codec`], so the wire format can change
//! without touching room or connection code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Whether encoded frames are UTF-8 text and should go out as text
    /// frames rather than binary ones.
    const TEXT: bool = false;

    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or do
    /// not match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] over JSON, the format browser clients speak.
///
/// ```rust
/// use volley_protocol::{ClientMessage, Codec, JsonCodec, Ruleset};
///
/// let msg: ClientMessage = JsonCodec
///     .decode(br#"{"type":"createRoom","ruleset":"special"}"#)
///     .unwrap();
/// assert_eq!(msg, ClientMessage::CreateRoom { ruleset: Ruleset::Special });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    const TEXT: bool = true;

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
