//! The server-role session host.
//!
//! [`SessionHost`] owns a transport, the [`ClientRegistry`] and the
//! [`EventQueue`]. It is the only thing that polls or sends on the
//! transport.
//!
//! ```text
//!            tick(timeout)
//!   transport ──RawEvent──→ classify ──Event──→ EventQueue ──→ pop_event()
//!                             │
//!                             └─ Connect: add_client / Disconnect: disconnect_client
//!
//!   send_to(id) / broadcast() ──→ registry lookup ──PeerHandle──→ transport.send
//! ```

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use gamelink_protocol::{ClientId, Packet, PeerHandle, Reliability};
use gamelink_transport::{RawEvent, RawEventKind, TransportHost};

use crate::{
    Client, ClientRegistry, Connectable, DesyncPolicy, Event, EventQueue,
    Sendable, SessionConfig, SessionError,
};

/// Lifecycle of a [`SessionHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Running,
    /// Stopped after the registry and transport diverged.
    Failed,
    ShutDown,
}

/// Authoritative server session over a [`TransportHost`].
///
/// `tick` is the single polling loop. It takes `&mut self`, so it can
/// never run concurrently with itself or with a send. Consumers on other
/// threads drain events through [`events`](Self::events).
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use gamelink_protocol::Reliability;
/// use gamelink_session::{EventKind, SessionConfig, SessionHost};
/// use gamelink_transport::{HostConfig, LoopbackNetwork};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let network = LoopbackNetwork::default();
/// let transport = network.create_host(HostConfig::server("arena", 8))?;
/// let mut host = SessionHost::new(transport, SessionConfig::default());
///
/// loop {
///     host.tick(Duration::from_millis(16)).await?;
///     while let Some(event) = host.pop_event() {
///         if event.kind == EventKind::Received {
///             host.broadcast(event.payload(), Reliability::Reliable)?;
///         }
///     }
/// }
/// # }
/// ```
pub struct SessionHost<T: TransportHost> {
    transport: T,
    registry: ClientRegistry,
    events: Arc<EventQueue>,
    config: SessionConfig,
    /// Raw events polled but not yet classified, when a tick is bounded.
    backlog: VecDeque<RawEvent>,
    state: HostState,
}

impl<T: TransportHost> SessionHost<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            registry: ClientRegistry::new(),
            events: Arc::new(EventQueue::new()),
            config,
            backlog: VecDeque::new(),
            state: HostState::Running,
        }
    }

    /// Runs one polling pass and returns how many events were queued.
    ///
    /// Waits up to `timeout` for the transport when nothing is ready;
    /// `Duration::ZERO` only takes what is already there. Raw events are
    /// handled in arrival order:
    ///
    /// - connect: a new client is registered and a `Connect` event queued;
    /// - disconnect: the client is marked disconnected and a `Disconnect`
    ///   event queued;
    /// - receive: the payload is queued as `Received`, tagged with the
    ///   sender's id when the sender is registered.
    ///
    /// # Errors
    /// - [`SessionError::Desynchronized`] if the transport reports a
    ///   connect for a live peer or a disconnect for an unknown one (under
    ///   [`DesyncPolicy::Terminate`]). Events classified before the
    ///   divergence stay queued.
    /// - [`SessionError::Terminated`] once the host has failed or shut down.
    /// - [`SessionError::Transport`] if polling fails.
    pub async fn tick(&mut self, timeout: Duration) -> Result<usize, SessionError> {
        self.ensure_running()?;

        let wait = if self.backlog.is_empty() {
            timeout
        } else {
            Duration::ZERO
        };
        let polled = self.transport.service(wait).await?;
        self.backlog.extend(polled);

        let limit = self
            .config
            .max_events_per_tick
            .map_or(usize::MAX, NonZeroUsize::get);
        let mut queued = 0;
        for _ in 0..limit {
            let Some(raw) = self.backlog.pop_front() else {
                break;
            };
            if let Some(event) = self.classify(raw)? {
                self.events.push_back(event);
                queued += 1;
            }
        }

        if !self.backlog.is_empty() {
            tracing::debug!(pending = self.backlog.len(), "tick limit reached, deferring events");
        }
        Ok(queued)
    }

    fn classify(&mut self, raw: RawEvent) -> Result<Option<Event>, SessionError> {
        let peer = raw.peer;
        match raw.kind {
            RawEventKind::None => {
                tracing::trace!(%peer, "ignoring empty transport event");
                Ok(None)
            }
            RawEventKind::Connect => {
                let added = self.registry.add_client(peer).map(|c| (c.id(), c.name()));
                match added {
                    Ok((id, name)) => {
                        tracing::info!(client_id = %id, %peer, name, "client connected");
                        Ok(Some(Event::connect(peer, Some(id))))
                    }
                    Err(SessionError::DuplicatePeer(_)) => {
                        Err(self.desync(format!("connect for already registered {peer}")))
                    }
                    Err(e) => Err(e),
                }
            }
            RawEventKind::Disconnect => {
                let removed = self
                    .registry
                    .disconnect_client(peer)
                    .map(|c| (c.id(), c.name()));
                match removed {
                    Ok((id, name)) => {
                        tracing::info!(client_id = %id, %peer, name, "client disconnected");
                        Ok(Some(Event::disconnect(peer, Some(id))))
                    }
                    Err(SessionError::PeerNotFound(_)) => {
                        Err(self.desync(format!("disconnect for unregistered {peer}")))
                    }
                    Err(e) => Err(e),
                }
            }
            RawEventKind::Receive => {
                let client_id = self.registry.get_by_peer(peer).map(Client::id);
                match client_id {
                    Some(id) => {
                        tracing::trace!(client_id = %id, bytes = raw.payload.len(), "payload received");
                    }
                    None => {
                        tracing::warn!(%peer, "payload from unregistered peer");
                    }
                }
                Ok(Some(Event::from_raw(raw, client_id)))
            }
        }
    }

    /// Applies the configured [`DesyncPolicy`] and returns the error to
    /// propagate.
    fn desync(&mut self, reason: String) -> SessionError {
        match self.config.desync_policy {
            DesyncPolicy::Panic => panic!("session desynchronized: {reason}"),
            DesyncPolicy::Terminate => {
                tracing::error!(%reason, "session desynchronized, terminating host");
                self.state = HostState::Failed;
                self.backlog.clear();
                SessionError::Desynchronized(reason)
            }
        }
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        match self.state {
            HostState::Running => Ok(()),
            HostState::Failed | HostState::ShutDown => Err(SessionError::Terminated),
        }
    }

    /// Pops the oldest queued event.
    pub fn pop_event(&self) -> Option<Event> {
        self.events.try_pop()
    }

    /// Shared handle to the event queue, for consumers on other threads.
    pub fn events(&self) -> Arc<EventQueue> {
        Arc::clone(&self.events)
    }

    /// Sends `payload` to every connected client and returns how many
    /// sends were handed to the transport.
    ///
    /// A transport failure for one client is logged and skipped; the rest
    /// still get the payload.
    ///
    /// # Errors
    /// [`SessionError::EmptyPayload`] or [`SessionError::Terminated`].
    pub fn broadcast(
        &mut self,
        payload: &[u8],
        reliability: Reliability,
    ) -> Result<usize, SessionError> {
        self.broadcast_filtered(None, payload, reliability)
    }

    /// Like [`broadcast`](Self::broadcast), skipping `exclude`.
    pub fn broadcast_except(
        &mut self,
        exclude: ClientId,
        payload: &[u8],
        reliability: Reliability,
    ) -> Result<usize, SessionError> {
        self.broadcast_filtered(Some(exclude), payload, reliability)
    }

    fn broadcast_filtered(
        &mut self,
        exclude: Option<ClientId>,
        payload: &[u8],
        reliability: Reliability,
    ) -> Result<usize, SessionError> {
        self.ensure_running()?;
        if payload.is_empty() {
            return Err(SessionError::EmptyPayload);
        }

        let mut sent = 0;
        for client in self.registry.connected() {
            if Some(client.id()) == exclude {
                continue;
            }
            match self.transport.send(client.peer(), payload, reliability) {
                Ok(()) => sent += 1,
                Err(e) => {
                    tracing::warn!(client_id = %client.id(), error = %e, "broadcast send failed");
                }
            }
        }
        tracing::debug!(sent, bytes = payload.len(), "broadcast");
        Ok(sent)
    }

    /// Sends `payload` to one connected client.
    ///
    /// # Errors
    /// - [`SessionError::EmptyPayload`] for an empty payload.
    /// - [`SessionError::ClientNotFound`] if `id` was never assigned or
    ///   the client has disconnected.
    /// - [`SessionError::Transport`] if the transport rejects the send.
    /// - [`SessionError::Terminated`] once the host has stopped.
    pub fn send_to(
        &mut self,
        id: ClientId,
        payload: &[u8],
        reliability: Reliability,
    ) -> Result<(), SessionError> {
        self.ensure_running()?;
        if payload.is_empty() {
            return Err(SessionError::EmptyPayload);
        }
        let peer = self.connected_peer(id)?;

        self.transport.send(peer, payload, reliability)?;
        tracing::trace!(client_id = %id, bytes = payload.len(), "sent");
        Ok(())
    }

    /// Asks the transport to drop a connected client.
    ///
    /// The client stays connected in the registry until the resulting
    /// disconnect is picked up by a later [`tick`](Self::tick), which
    /// queues the one `Disconnect` event for it.
    ///
    /// # Errors
    /// [`SessionError::ClientNotFound`] if `id` is not connected.
    pub fn disconnect_client(&mut self, id: ClientId) -> Result<(), SessionError> {
        self.ensure_running()?;
        let peer = self.connected_peer(id)?;

        self.transport.disconnect(peer)?;
        tracing::info!(client_id = %id, %peer, "kicking client");
        Ok(())
    }

    fn connected_peer(&self, id: ClientId) -> Result<PeerHandle, SessionError> {
        self.registry
            .get_by_id(id)
            .filter(|c| c.is_connected())
            .map(Client::peer)
            .ok_or(SessionError::ClientNotFound(id))
    }

    /// Stops the host: clears pending events and destroys the transport.
    ///
    /// Safe to call more than once, and after a failure.
    pub async fn shutdown(&mut self) -> Result<(), SessionError> {
        if self.state == HostState::ShutDown {
            return Ok(());
        }
        self.events.clear();
        self.backlog.clear();
        self.state = HostState::ShutDown;

        self.transport.destroy().await?;
        tracing::info!(clients = self.registry.len(), "session host shut down");
        Ok(())
    }

    /// The client with `id`, connected or not.
    pub fn get_client(&self, id: ClientId) -> Option<&Client> {
        self.registry.get_by_id(id)
    }

    pub fn client_by_peer(&self, peer: PeerHandle) -> Option<&Client> {
        self.registry.get_by_peer(peer)
    }

    /// Every client ever registered, in id order.
    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.registry.iter()
    }

    pub fn connected_clients(&self) -> impl Iterator<Item = &Client> {
        self.registry.connected()
    }

    pub fn connected_count(&self) -> usize {
        self.registry.connected_count()
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// Routes by the packet's `client_id`; a packet without one is broadcast.
impl<T: TransportHost> Sendable for SessionHost<T> {
    fn send(&mut self, packet: Packet) -> Result<(), SessionError> {
        match packet.client_id {
            Some(id) => self.send_to(id, &packet.payload, packet.reliability),
            None => self
                .broadcast(&packet.payload, packet.reliability)
                .map(|_| ()),
        }
    }
}
