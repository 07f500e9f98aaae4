//! Session layer for gamelink.
//!
//! Sits between a [`TransportHost`](gamelink_transport::TransportHost) and
//! the game. The transport speaks in peer handles and raw events; this
//! crate turns those into:
//!
//! - stable [`ClientId`](gamelink_protocol::ClientId)s, allocated by the
//!   [`ClientRegistry`] in connect order and never reused;
//! - typed [`Event`]s in a thread-safe [`EventQueue`];
//! - unicast and broadcast sends keyed by client id.
//!
//! [`SessionHost`] is the server role and [`HostClient`] the thin-client
//! role. Both implement the [`Connectable`]/[`Sendable`] capability
//! traits where they apply and feed [`dispatch_events`].
//!
//! # Threading
//!
//! One task owns a session and is the only one that ticks or sends.
//! Events can be drained elsewhere through the `Arc<EventQueue>` returned
//! by `events()`. To send from several tasks, wrap the session in a lock.

mod client;
mod config;
mod dispatch;
mod error;
mod event;
mod host;
mod host_client;
mod names;
mod queue;
mod registry;
#[cfg(test)]
mod test_support;

pub use client::{Client, ClientState, Connectable, Sendable};
pub use config::{DesyncPolicy, SessionConfig};
pub use dispatch::{EventHandler, EventSource, dispatch_events};
pub use error::SessionError;
pub use event::{Event, EventKind};
pub use host::{HostState, SessionHost};
pub use host_client::HostClient;
pub use names::client_name;
pub use queue::EventQueue;
pub use registry::ClientRegistry;
