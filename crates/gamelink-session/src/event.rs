//! Normalized session events.

use std::borrow::Cow;
use std::fmt;

use gamelink_protocol::{ClientId, Packet, PeerHandle};
use gamelink_transport::{RawEvent, RawEventKind};

/// What an [`Event`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    None,
    Connect,
    Disconnect,
    Received,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Connect => write!(f, "connect"),
            Self::Disconnect => write!(f, "disconnect"),
            Self::Received => write!(f, "received"),
        }
    }
}

impl From<RawEventKind> for EventKind {
    fn from(kind: RawEventKind) -> Self {
        match kind {
            RawEventKind::None => Self::None,
            RawEventKind::Connect => Self::Connect,
            RawEventKind::Disconnect => Self::Disconnect,
            RawEventKind::Receive => Self::Received,
        }
    }
}

/// One transport event after the session has resolved who it is about.
///
/// `client_id` is the id just allocated for a connect, the existing id
/// for a receive or disconnect, and `None` when the peer was never
/// registered. Only `Received` carries a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub peer: PeerHandle,
    pub client_id: Option<ClientId>,
    pub payload: Vec<u8>,
}

impl Event {
    /// Wraps a raw event. The payload moves over untouched.
    pub fn from_raw(raw: RawEvent, client_id: Option<ClientId>) -> Self {
        Self {
            kind: raw.kind.into(),
            peer: raw.peer,
            client_id,
            payload: raw.payload,
        }
    }

    pub fn connect(peer: PeerHandle, client_id: Option<ClientId>) -> Self {
        Self {
            kind: EventKind::Connect,
            peer,
            client_id,
            payload: Vec::new(),
        }
    }

    pub fn disconnect(peer: PeerHandle, client_id: Option<ClientId>) -> Self {
        Self {
            kind: EventKind::Disconnect,
            peer,
            client_id,
            payload: Vec::new(),
        }
    }

    pub fn received(peer: PeerHandle, client_id: Option<ClientId>, payload: Vec<u8>) -> Self {
        Self {
            kind: EventKind::Received,
            peer,
            client_id,
            payload,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// The payload as text, replacing invalid UTF-8.
    pub fn payload_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Converts into a packet addressed from this event's origin.
    pub fn into_packet(self) -> Packet {
        let mut packet = Packet::new(self.payload).with_peer(self.peer);
        packet.client_id = self.client_id;
        packet
    }
}
