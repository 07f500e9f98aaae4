//! Error types for the protocol layer.

/// Errors that can occur while turning typed values into payload bytes
/// and back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed bytes, missing fields, or the
    /// payload holds a different message type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload is not valid for the requested view (e.g. not UTF-8).
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
