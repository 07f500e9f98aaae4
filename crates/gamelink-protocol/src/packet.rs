//! Client identity and the packet envelope.

use std::borrow::Cow;
use std::fmt;

use gamelink_transport::{PeerHandle, RawEvent, Reliability};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Codec, ProtocolError};

/// Stable identity of one connected party.
///
/// Assigned densely from 0 by the session host, in connect order, and
/// never reused for the lifetime of that host. Serializes as the bare
/// integer so applications can tell a client its own id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClientId(pub u32);

impl ClientId {
    /// Position of this client in a dense, id-ordered table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// A payload plus addressing and delivery metadata.
///
/// Built two ways:
/// - from an incoming transport event ([`Packet::from`] a `RawEvent`):
///   `peer` is the origin, `client_id` is filled in once resolved;
/// - by the application for a send: payload, reliability, and either a
///   destination `client_id` or nothing (for a broadcast or a send to the
///   server).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    pub peer: Option<PeerHandle>,
    pub client_id: Option<ClientId>,
    pub reliability: Reliability,
    pub payload: Vec<u8>,
}

impl Packet {
    /// A reliable packet carrying `payload`, with no addressing yet.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    pub fn from_string(text: &str) -> Self {
        Self::new(text.as_bytes())
    }

    /// Encodes `value` with `codec` into a new reliable packet.
    pub fn encode<C: Codec, T: Serialize>(
        codec: &C,
        value: &T,
    ) -> Result<Self, ProtocolError> {
        Ok(Self::new(codec.encode(value)?))
    }

    /// Decodes the payload with `codec`.
    pub fn decode<C: Codec, T: DeserializeOwned>(&self, codec: &C) -> Result<T, ProtocolError> {
        codec.decode(&self.payload)
    }

    /// Addresses the packet to a client.
    pub fn for_client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn with_peer(mut self, peer: PeerHandle) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn with_reliability(mut self, reliability: Reliability) -> Self {
        self.reliability = reliability;
        self
    }

    pub fn unreliable(self) -> Self {
        self.with_reliability(Reliability::Unreliable)
    }

    /// The payload as UTF-8 text.
    pub fn as_str(&self) -> Result<&str, ProtocolError> {
        std::str::from_utf8(&self.payload)
            .map_err(|e| ProtocolError::InvalidPayload(e.to_string()))
    }

    /// The payload as text, replacing invalid UTF-8.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }
}

impl From<RawEvent> for Packet {
    fn from(event: RawEvent) -> Self {
        Self {
            peer: Some(event.peer),
            client_id: None,
            reliability: Reliability::default(),
            payload: event.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_display_and_index() {
        let id = ClientId(3);
        assert_eq!(id.to_string(), "C-3");
        assert_eq!(id.index(), 3);
    }

    #[test]
    fn test_client_id_orders_by_value() {
        assert!(ClientId(0) < ClientId(1));
    }

    #[test]
    fn test_packet_new_defaults_to_reliable_unaddressed() {
        let packet = Packet::new(vec![1, 2, 3]);

        assert_eq!(packet.reliability, Reliability::Reliable);
        assert_eq!(packet.peer, None);
        assert_eq!(packet.client_id, None);
        assert_eq!(packet.len(), 3);
    }

    #[test]
    fn test_packet_builders_set_addressing() {
        let packet = Packet::from_string("x")
            .for_client(ClientId(7))
            .with_peer(PeerHandle::new(9))
            .unreliable();

        assert_eq!(packet.client_id, Some(ClientId(7)));
        assert_eq!(packet.peer, Some(PeerHandle::new(9)));
        assert_eq!(packet.reliability, Reliability::Unreliable);
    }

    #[test]
    fn test_packet_from_raw_event_keeps_origin_and_bytes() {
        let raw = RawEvent::receive(PeerHandle::new(4), vec![0, 159, 146, 150]);

        let packet = Packet::from(raw);

        assert_eq!(packet.peer, Some(PeerHandle::new(4)));
        assert_eq!(packet.payload, vec![0, 159, 146, 150]);
    }

    #[test]
    fn test_packet_as_str_rejects_invalid_utf8() {
        let packet = Packet::new(vec![0xff, 0xfe]);

        assert!(matches!(packet.as_str(), Err(ProtocolError::InvalidPayload(_))));
        assert_eq!(packet.to_string_lossy(), "\u{fffd}\u{fffd}");
    }

    #[test]
    fn test_packet_as_str_reads_text() {
        assert_eq!(Packet::from_string("ping").as_str().unwrap(), "ping");
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_packet_encode_decode_through_codec() {
        use crate::JsonCodec;

        let packet = Packet::encode(&JsonCodec, &ClientId(12)).unwrap();
        assert_eq!(packet.payload, b"12");

        let id: ClientId = packet.decode(&JsonCodec).unwrap();
        assert_eq!(id, ClientId(12));
    }
}
