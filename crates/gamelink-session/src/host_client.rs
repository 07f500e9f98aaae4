//! The client-role session.
//!
//! A [`HostClient`] is the thin-client counterpart of
//! [`SessionHost`](crate::SessionHost): one outgoing connection to a
//! server, the same [`Event`] types, the same queue discipline.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use gamelink_protocol::{ClientId, Packet, PeerHandle, Reliability};
use gamelink_transport::{RawEvent, RawEventKind, TransportHost};

use crate::{
    ClientState, Connectable, Event, EventQueue, Sendable, SessionConfig,
    SessionError,
};

/// A session connected to one server.
pub struct HostClient<T: TransportHost> {
    transport: T,
    server: Option<PeerHandle>,
    /// The id the server assigned us, once the application learns it.
    client_id: Option<ClientId>,
    state: ClientState,
    events: Arc<EventQueue>,
    config: SessionConfig,
    backlog: VecDeque<RawEvent>,
    shut_down: bool,
}

impl<T: TransportHost> HostClient<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            server: None,
            client_id: None,
            state: ClientState::None,
            events: Arc::new(EventQueue::new()),
            config,
            backlog: VecDeque::new(),
            shut_down: false,
        }
    }

    /// Starts connecting to `addr`.
    ///
    /// The session becomes connected when a later [`tick`](Self::tick)
    /// sees the server accept; that tick queues a `Connect` event. A
    /// refusal either fails this call with a transport error or makes the
    /// tick queue a `Disconnect`. Both leave the session in
    /// [`ClientState::None`], so it can try again.
    ///
    /// # Errors
    /// - [`SessionError::InvalidTransition`] if a connection exists or is
    ///   already in progress.
    /// - [`SessionError::Transport`] if the transport cannot connect.
    pub async fn connect(&mut self, addr: &str) -> Result<PeerHandle, SessionError> {
        self.ensure_alive()?;
        if self.state != ClientState::None || self.server.is_some() {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: ClientState::Connected,
            });
        }

        let server = self.transport.connect(addr).await?;
        self.server = Some(server);
        tracing::info!(addr, %server, "connecting to server");
        Ok(server)
    }

    /// Runs one polling pass and returns how many events were queued.
    ///
    /// # Errors
    /// [`SessionError::Terminated`] after shutdown, or a transport error.
    pub async fn tick(&mut self, timeout: Duration) -> Result<usize, SessionError> {
        self.ensure_alive()?;

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
        Ok(queued)
    }

    fn classify(&mut self, raw: RawEvent) -> Result<Option<Event>, SessionError> {
        let peer = raw.peer;
        if raw.kind != RawEventKind::None && self.server != Some(peer) {
            tracing::warn!(%peer, kind = %raw.kind, "event from unexpected peer");
            return Ok(None);
        }

        match raw.kind {
            RawEventKind::None => Ok(None),
            RawEventKind::Connect => {
                if self.state.transition(ClientState::Connected).is_err() {
                    tracing::warn!(server = %peer, state = %self.state, "unexpected connect from server");
                    return Ok(None);
                }
                tracing::info!(server = %peer, "connected to server");
                Ok(Some(Event::connect(peer, self.client_id)))
            }
            RawEventKind::Disconnect => {
                if self.state == ClientState::Connected {
                    self.state.transition(ClientState::Disconnected)?;
                    tracing::info!(server = %peer, "disconnected from server");
                } else {
                    // Refused before the connection was established.
                    self.server = None;
                    tracing::warn!(server = %peer, "server refused connection");
                }
                Ok(Some(Event::disconnect(peer, self.client_id)))
            }
            RawEventKind::Receive => {
                tracing::trace!(bytes = raw.payload.len(), "payload received from server");
                Ok(Some(Event::from_raw(raw, self.client_id)))
            }
        }
    }

    fn ensure_alive(&self) -> Result<(), SessionError> {
        if self.shut_down {
            Err(SessionError::Terminated)
        } else {
            Ok(())
        }
    }

    fn connected_server(&self) -> Result<PeerHandle, SessionError> {
        match self.server {
            Some(server) if self.state == ClientState::Connected => Ok(server),
            _ => Err(SessionError::NotConnected),
        }
    }

    /// Sends `payload` to the server.
    ///
    /// # Errors
    /// [`SessionError::EmptyPayload`], [`SessionError::NotConnected`], or
    /// a transport error.
    pub fn send_to_server(
        &mut self,
        payload: &[u8],
        reliability: Reliability,
    ) -> Result<(), SessionError> {
        self.ensure_alive()?;
        if payload.is_empty() {
            return Err(SessionError::EmptyPayload);
        }
        let server = self.connected_server()?;

        self.transport.send(server, payload, reliability)?;
        Ok(())
    }

    /// Starts closing the connection. A later tick queues the
    /// `Disconnect` event.
    pub fn disconnect(&mut self) -> Result<(), SessionError> {
        self.ensure_alive()?;
        let server = self.connected_server()?;
        self.transport.disconnect(server)?;
        Ok(())
    }

    /// Clears pending events and destroys the transport. Idempotent.
    pub async fn shutdown(&mut self) -> Result<(), SessionError> {
        if self.shut_down {
            return Ok(());
        }
        self.events.clear();
        self.backlog.clear();
        self.shut_down = true;
        self.transport.destroy().await?;
        tracing::info!("client session shut down");
        Ok(())
    }

    /// Records the id the server assigned to this client.
    pub fn set_client_id(&mut self, id: ClientId) {
        self.client_id = Some(id);
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn server_peer(&self) -> Option<PeerHandle> {
        self.server
    }

    pub fn pop_event(&self) -> Option<Event> {
        self.events.try_pop()
    }

    pub fn events(&self) -> Arc<EventQueue> {
        Arc::clone(&self.events)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: TransportHost> Connectable for HostClient<T> {
    fn state(&self) -> ClientState {
        self.state
    }
}

/// Always sends to the server; the packet's addressing is ignored.
impl<T: TransportHost> Sendable for HostClient<T> {
    fn send(&mut self, packet: Packet) -> Result<(), SessionError> {
        self.send_to_server(&packet.payload, packet.reliability)
    }
}
