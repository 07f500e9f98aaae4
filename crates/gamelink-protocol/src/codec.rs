//! Codec trait and implementations for typed payloads.
//!
//! Payloads are opaque to the session layer. Applications that want to
//! put structured messages inside them pick a [`Codec`]; the rest of the
//! stack never looks at the bytes.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to payload bytes and decodes them back.
///
/// `Send + Sync + 'static` so one codec can be shared by every task that
/// touches the session.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Readable in logs and packet captures. Behind the `json` feature
/// (enabled by default).
///
/// ```rust
/// use gamelink_protocol::{Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&("move", 3, -1)).unwrap();
/// let decoded: (String, i32, i32) = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, ("move".to_string(), 3, -1));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Move {
        dx: i32,
        dy: i32,
    }

    #[test]
    fn test_json_codec_encodes_as_json_text() {
        let bytes = JsonCodec.encode(&Move { dx: 1, dy: -2 }).unwrap();

        assert_eq!(bytes, br#"{"dx":1,"dy":-2}"#);
    }

    #[test]
    fn test_json_codec_decode_garbage_returns_decode_error() {
        let result: Result<Move, _> = JsonCodec.decode(b"\x00\x01not json");

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_decode_wrong_shape_returns_decode_error() {
        let result: Result<Move, _> = JsonCodec.decode(br#"{"dx":1}"#);

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
