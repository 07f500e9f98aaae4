//! Error types for the session layer.

use gamelink_protocol::{ClientId, PeerHandle};
use gamelink_transport::TransportError;

use crate::ClientState;

/// Errors returned by the registry, the event queue and both session
/// roles.
///
/// Most variants are caller misuse and are safe to handle and continue.
/// [`Desynchronized`](Self::Desynchronized) and
/// [`Terminated`](Self::Terminated) are not: see [`is_fatal`](Self::is_fatal).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A connect was reported for a peer handle that already has a
    /// connected client.
    #[error("peer {0} is already registered")]
    DuplicatePeer(PeerHandle),

    /// Every `u32` client id has been handed out. Ids are never reused,
    /// so the host cannot admit anyone else.
    #[error("client ids exhausted")]
    ClientIdsExhausted,

    /// No connected client has this id.
    /// Expected at runtime when a send races a disconnect.
    #[error("client {0} not found")]
    ClientNotFound(ClientId),

    /// No connected client is registered for this peer handle.
    #[error("no client registered for {0}")]
    PeerNotFound(PeerHandle),

    /// Sending zero bytes. Usually an envelope that was never filled in.
    #[error("payload is empty")]
    EmptyPayload,

    #[error("event queue is empty")]
    QueueEmpty,

    /// A connection state change the state machine does not allow.
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: ClientState, to: ClientState },

    /// The client-role session has no live connection to a server.
    #[error("not connected to a server")]
    NotConnected,

    /// The registry and the transport disagree about who is connected.
    /// The host stops accepting work after this.
    #[error("registry and transport diverged: {0}")]
    Desynchronized(String),

    /// The host failed earlier and no longer ticks or sends.
    #[error("session host has terminated")]
    Terminated,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Whether the host that returned this error can keep running.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Desynchronized(_) | Self::Terminated)
    }
}
