//! Messages shared by the echo demo binaries.

use serde::{Deserialize, Serialize};

/// Address used when `GAMELINK_ADDR` is unset.
pub const DEFAULT_ADDR: &str = "127.0.0.1:7777";

/// Reads the server address from `GAMELINK_ADDR`.
pub fn addr_from_env() -> String {
    std::env::var("GAMELINK_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string())
}

/// Client → server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    Say(String),
}

/// Server → client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once, right after connecting.
    Welcome { client_id: u32, name: String },
    Echo { from: String, text: String },
    Left { name: String },
}

#[cfg(test)]
mod tests {
    use gamelink::{Codec, JsonCodec};

    use super::*;

    #[test]
    fn test_server_message_json_is_tagged() {
        let bytes = JsonCodec
            .encode(&ServerMessage::Left { name: "Otter".into() })
            .unwrap();
        assert_eq!(bytes, br#"{"type":"left","name":"Otter"}"#);
    }

    #[test]
    fn test_client_message_decodes() {
        let msg: ClientMessage = JsonCodec.decode(br#"{"Say":"hi"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Say("hi".into()));
    }
}
