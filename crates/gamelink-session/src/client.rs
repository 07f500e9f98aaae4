//! The client record, its connection state machine, and the capability
//! traits shared by both session roles.

use std::fmt;

use gamelink_protocol::{ClientId, Packet, PeerHandle};

use crate::SessionError;

/// Connection state of a [`Client`] or a [`HostClient`](crate::HostClient).
///
/// ```text
/// None ──connect──→ Connected ──disconnect──→ Disconnected
/// ```
///
/// `Disconnected` is terminal. A peer that comes back is a new client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClientState {
    #[default]
    None,
    Connected,
    Disconnected,
}

impl ClientState {
    /// Applies `to`, or fails if the state machine forbids it.
    pub(crate) fn transition(&mut self, to: ClientState) -> Result<(), SessionError> {
        let allowed = matches!(
            (*self, to),
            (Self::None, Self::Connected) | (Self::Connected, Self::Disconnected)
        );
        if !allowed {
            return Err(SessionError::InvalidTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Anything with a connection lifecycle.
pub trait Connectable {
    fn state(&self) -> ClientState;

    fn is_connected(&self) -> bool {
        self.state() == ClientState::Connected
    }
}

/// Anything that can put a [`Packet`] on the wire.
pub trait Sendable {
    /// Sends `packet` with its own reliability.
    ///
    /// # Errors
    /// [`SessionError::EmptyPayload`] for an empty packet, plus whatever
    /// the role's own addressing rules reject.
    fn send(&mut self, packet: Packet) -> Result<(), SessionError>;
}

/// One connected party as seen by the server.
///
/// Owned by the [`ClientRegistry`](crate::ClientRegistry); callers only
/// ever get shared references or clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    id: ClientId,
    name: &'static str,
    state: ClientState,
    peer: PeerHandle,
}

impl Client {
    pub(crate) fn new(id: ClientId, name: &'static str, peer: PeerHandle) -> Self {
        Self {
            id,
            name,
            state: ClientState::None,
            peer,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The transport handle this client arrived on.
    ///
    /// Only meaningful while connected; a disconnected client's handle is
    /// stale and never used for sends.
    pub fn peer(&self) -> PeerHandle {
        self.peer
    }

    pub(crate) fn connect(&mut self) -> Result<(), SessionError> {
        self.state.transition(ClientState::Connected)
    }

    pub(crate) fn disconnect(&mut self) -> Result<(), SessionError> {
        self.state.transition(ClientState::Disconnected)
    }
}

impl Connectable for Client {
    fn state(&self) -> ClientState {
        self.state
    }
}
