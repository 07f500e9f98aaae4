//! # gamelink
//!
//! Session layer for authoritative game servers and thin game clients.
//!
//! A transport moves bytes between peer handles. gamelink adds what games
//! need on top: a stable [`ClientId`] per connected party, a thread-safe
//! queue of typed [`Event`]s, and sends addressed by client id.
//!
//! This crate bundles the pieces over WebSocket:
//!
//! - [`ServerBuilder`] → [`GameServer`] (a [`SessionHost`])
//! - [`ClientBuilder`] → [`GameClient`] (a [`HostClient`])
//! - [`GamelinkError`] wrapping every sub-crate error
//! - [`init_logging`] for binaries
//!
//! For tests or single-process games, build a [`SessionHost`] directly on
//! a [`LoopbackNetwork`](gamelink_transport::LoopbackNetwork) host.

mod builder;
mod error;
mod logging;

pub use builder::{ClientBuilder, GameClient, GameServer, ServerBuilder, local_addr};
pub use error::GamelinkError;
pub use logging::init_logging;

pub use gamelink_protocol::{ClientId, Codec, JsonCodec, Packet, PeerHandle, Reliability};
pub use gamelink_session::{
    Client, ClientState, Connectable, DesyncPolicy, Event, EventHandler, EventKind,
    EventQueue, HostClient, HostState, Sendable, SessionConfig, SessionError, SessionHost,
    dispatch_events,
};
pub use gamelink_transport::{
    HostConfig, LoopbackConfig, LoopbackHost, LoopbackNetwork, TransportError,
    TransportHost, WebSocketHost,
};

/// Everything a typical server or client loop needs.
pub mod prelude {
    pub use crate::{
        ClientBuilder, ClientId, Codec, Connectable, Event, EventHandler, EventKind,
        GameClient, GameServer, GamelinkError, JsonCodec, Packet, Reliability, Sendable,
        ServerBuilder, SessionConfig, dispatch_events, init_logging,
    };
}
