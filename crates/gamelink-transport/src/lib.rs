//! Transport binding for gamelink.
//!
//! The session layer never talks to sockets directly. It drives a
//! [`TransportHost`]: something that can poll for connect, disconnect and
//! receive events, and send bytes to a peer identified by an opaque
//! [`PeerHandle`].
//!
//! Two bindings ship with the crate:
//!
//! - [`LoopbackNetwork`]: in-process hosts wired together by channels.
//!   Used by tests and by anything that wants a server and clients in one
//!   process. Can simulate loss on unreliable sends.
//! - `WebSocketHost` (feature `websocket`, default): real network hosts
//!   over `tokio-tungstenite`.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket binding via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod loopback;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use loopback::{LoopbackConfig, LoopbackHost, LoopbackNetwork};
#[cfg(feature = "websocket")]
pub use websocket::WebSocketHost;

use std::fmt;
use std::time::Duration;

/// Opaque identifier for one end of a connection.
///
/// Only meaningful to the host that produced it. Handles are never reused
/// by a binding, so a reconnecting remote always shows up with a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerHandle(u64);

impl PeerHandle {
    /// Creates a new `PeerHandle` from a raw `u64`.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Delivery guarantee requested for a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reliability {
    /// Delivered and ordered.
    #[default]
    Reliable,
    /// Best effort. May be dropped.
    Unreliable,
}

impl Reliability {
    pub fn is_reliable(self) -> bool {
        matches!(self, Self::Reliable)
    }
}

impl From<bool> for Reliability {
    fn from(reliable: bool) -> Self {
        if reliable {
            Self::Reliable
        } else {
            Self::Unreliable
        }
    }
}

/// What happened on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawEventKind {
    None,
    Connect,
    Disconnect,
    Receive,
}

impl fmt::Display for RawEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Connect => write!(f, "connect"),
            Self::Disconnect => write!(f, "disconnect"),
            Self::Receive => write!(f, "receive"),
        }
    }
}

/// One event reported by [`TransportHost::service`].
///
/// `payload` is empty for everything except `Receive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: RawEventKind,
    pub peer: PeerHandle,
    pub payload: Vec<u8>,
}

impl RawEvent {
    pub fn connect(peer: PeerHandle) -> Self {
        Self {
            kind: RawEventKind::Connect,
            peer,
            payload: Vec::new(),
        }
    }

    pub fn disconnect(peer: PeerHandle) -> Self {
        Self {
            kind: RawEventKind::Disconnect,
            peer,
            payload: Vec::new(),
        }
    }

    pub fn receive(peer: PeerHandle, payload: Vec<u8>) -> Self {
        Self {
            kind: RawEventKind::Receive,
            peer,
            payload,
        }
    }
}

/// Parameters for creating a host.
///
/// `bind_addr` decides the role: `Some` listens for incoming peers (server),
/// `None` creates a host that only connects outward (client).
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub bind_addr: Option<String>,
    /// Maximum simultaneous peers. Connects beyond this are refused.
    pub max_peers: usize,
    /// Number of logical channels. Kept for parity with channel-based
    /// transports; the bundled bindings use a single ordered stream.
    pub channel_count: usize,
}

impl HostConfig {
    /// Config for a listening host.
    pub fn server(bind_addr: impl Into<String>, max_peers: usize) -> Self {
        Self {
            bind_addr: Some(bind_addr.into()),
            max_peers,
            ..Self::default()
        }
    }

    /// Config for a host that connects to a single server.
    pub fn client() -> Self {
        Self {
            bind_addr: None,
            max_peers: 1,
            ..Self::default()
        }
    }

    pub fn is_server(&self) -> bool {
        self.bind_addr.is_some()
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_addr: None,
            max_peers: 32,
            channel_count: 2,
        }
    }
}

/// A host created by a transport binding.
///
/// Polling is async: [`service`](Self::service) may wait up to its timeout
/// for the first event. Sending and disconnecting only enqueue work and
/// never wait.
pub trait TransportHost: Send + 'static {
    /// Starts connecting to a listening host. Client-role hosts only.
    ///
    /// The returned handle is the peer the eventual `Connect` (or, if the
    /// server refuses, `Disconnect`) event will carry. A binding that
    /// learns of the refusal during its handshake returns
    /// [`TransportError::ConnectFailed`] instead and reports no event.
    async fn connect(&mut self, addr: &str) -> Result<PeerHandle, TransportError>;

    /// Returns every event that is ready, in arrival order.
    ///
    /// If nothing is ready, waits up to `timeout` for the first event and
    /// then drains whatever else arrived. A zero timeout never waits.
    async fn service(
        &mut self,
        timeout: Duration,
    ) -> Result<Vec<RawEvent>, TransportError>;

    /// Queues `data` for delivery to `peer`.
    fn send(
        &mut self,
        peer: PeerHandle,
        data: &[u8],
        reliability: Reliability,
    ) -> Result<(), TransportError>;

    /// Starts closing the connection to `peer`.
    ///
    /// Both sides observe a `Disconnect` event for it afterwards.
    fn disconnect(&mut self, peer: PeerHandle) -> Result<(), TransportError>;

    /// Number of peers currently connected to this host.
    fn peer_count(&self) -> usize;

    /// Releases the host. Remote peers observe a `Disconnect`.
    ///
    /// Every later call returns [`TransportError::Destroyed`].
    async fn destroy(&mut self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_handle_new_and_into_inner() {
        let peer = PeerHandle::new(42);
        assert_eq!(peer.into_inner(), 42);
    }

    #[test]
    fn test_peer_handle_display() {
        assert_eq!(PeerHandle::new(7).to_string(), "peer-7");
    }

    #[test]
    fn test_peer_handle_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(PeerHandle::new(1), "alice");
        map.insert(PeerHandle::new(2), "bob");
        assert_eq!(map[&PeerHandle::new(1)], "alice");
    }

    #[test]
    fn test_reliability_from_bool() {
        assert_eq!(Reliability::from(true), Reliability::Reliable);
        assert_eq!(Reliability::from(false), Reliability::Unreliable);
        assert!(Reliability::default().is_reliable());
    }

    #[test]
    fn test_raw_event_constructors_set_kind() {
        let peer = PeerHandle::new(3);
        assert_eq!(RawEvent::connect(peer).kind, RawEventKind::Connect);
        assert_eq!(RawEvent::disconnect(peer).kind, RawEventKind::Disconnect);

        let received = RawEvent::receive(peer, b"ping".to_vec());
        assert_eq!(received.kind, RawEventKind::Receive);
        assert_eq!(received.payload, b"ping");
    }

    #[test]
    fn test_host_config_roles() {
        let server = HostConfig::server("127.0.0.1:0", 2);
        assert!(server.is_server());
        assert_eq!(server.max_peers, 2);
        assert_eq!(server.channel_count, 2);

        let client = HostConfig::client();
        assert!(!client.is_server());
        assert_eq!(client.max_peers, 1);
    }
}
