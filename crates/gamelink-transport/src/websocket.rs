//! WebSocket binding using `tokio-tungstenite`.
//!
//! Every connection runs as two tasks: a reader that forwards frames into
//! the host's inbox, and a writer that drains the peer's outbound channel.
//! The host itself only touches channels, so `send` and `disconnect` never
//! wait on the network.
//!
//! A listening host counts live connections in a slot counter shared with
//! the accept loop. When every slot is taken the handshake is answered
//! with `503 Service Unavailable`, so a refused remote never sees an open
//! connection.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;

use crate::{
    HostConfig, PeerHandle, RawEvent, Reliability, TransportError,
    TransportHost,
};

/// Counter for generating unique peer handles.
static NEXT_PEER: AtomicU64 = AtomicU64::new(1);

enum Delivery {
    Opened {
        peer: PeerHandle,
        outbound: mpsc::UnboundedSender<Outbound>,
    },
    Frame { peer: PeerHandle, payload: Vec<u8> },
    Closed { peer: PeerHandle },
}

enum Outbound {
    Data(Vec<u8>),
    Close,
}

/// A [`TransportHost`] speaking WebSocket.
///
/// WebSocket is always reliable and ordered, so unreliable sends are
/// delivered reliably.
pub struct WebSocketHost {
    config: HostConfig,
    local_addr: Option<SocketAddr>,
    inbox: mpsc::UnboundedReceiver<Delivery>,
    inbox_tx: mpsc::UnboundedSender<Delivery>,
    peers: HashMap<PeerHandle, mpsc::UnboundedSender<Outbound>>,
    local_events: VecDeque<RawEvent>,
    accept_task: Option<JoinHandle<()>>,
    destroyed: bool,
}

impl WebSocketHost {
    /// Creates a host. Binds and starts accepting when `bind_addr` is set.
    pub async fn create(config: HostConfig) -> Result<Self, TransportError> {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();

        let (local_addr, accept_task) = match &config.bind_addr {
            Some(addr) => {
                let listener =
                    TcpListener::bind(addr).await.map_err(TransportError::Bind)?;
                let local_addr = listener.local_addr().map_err(TransportError::Bind)?;
                tracing::info!(%local_addr, max_peers = config.max_peers, "WebSocket host listening");
                let slots = Arc::new(AtomicUsize::new(0));
                let task = tokio::spawn(accept_loop(
                    listener,
                    inbox_tx.clone(),
                    slots,
                    config.max_peers,
                ));
                (Some(local_addr), Some(task))
            }
            None => (None, None),
        };

        Ok(Self {
            config,
            local_addr,
            inbox,
            inbox_tx,
            peers: HashMap::new(),
            local_events: VecDeque::new(),
            accept_task,
            destroyed: false,
        })
    }

    /// The address the host listens on, if it is a server.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    fn ensure_alive(&self) -> Result<(), TransportError> {
        if self.destroyed {
            Err(TransportError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn drain_ready(&mut self, events: &mut Vec<RawEvent>) {
        events.extend(self.local_events.drain(..));
        while let Ok(delivery) = self.inbox.try_recv() {
            self.handle_delivery(delivery, events);
        }
    }

    fn handle_delivery(&mut self, delivery: Delivery, events: &mut Vec<RawEvent>) {
        match delivery {
            Delivery::Opened { peer, outbound } => {
                self.peers.insert(peer, outbound);
                events.push(RawEvent::connect(peer));
            }
            Delivery::Frame { peer, payload } => {
                if self.peers.contains_key(&peer) {
                    events.push(RawEvent::receive(peer, payload));
                }
            }
            Delivery::Closed { peer } => {
                // Reader and writer both report; only the first counts.
                if self.peers.remove(&peer).is_some() {
                    events.push(RawEvent::disconnect(peer));
                }
            }
        }
    }

    fn release(&mut self) {
        for (_, outbound) in self.peers.drain() {
            let _ = outbound.send(Outbound::Close);
        }
        if let Some(task) = self.accept_task.take() {
            task.abort();
        }
        self.local_events.clear();
        self.destroyed = true;
    }
}

impl TransportHost for WebSocketHost {
    async fn connect(&mut self, addr: &str) -> Result<PeerHandle, TransportError> {
        self.ensure_alive()?;
        if self.config.is_server() {
            return Err(TransportError::NotClientRole);
        }
        if self.peers.len() >= self.config.max_peers {
            return Err(TransportError::ConnectFailed(format!(
                "host already has {} peer(s)",
                self.config.max_peers
            )));
        }

        let url = format!("ws://{addr}");
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        let peer = next_peer();
        tracing::debug!(%peer, addr, "WebSocket connection established");
        spawn_connection(peer, ws, self.inbox_tx.clone(), None);
        Ok(peer)
    }

    async fn service(
        &mut self,
        timeout: Duration,
    ) -> Result<Vec<RawEvent>, TransportError> {
        self.ensure_alive()?;

        let mut events = Vec::new();
        self.drain_ready(&mut events);
        if !events.is_empty() || timeout.is_zero() {
            return Ok(events);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        while events.is_empty() {
            match tokio::time::timeout_at(deadline, self.inbox.recv()).await {
                Ok(Some(delivery)) => {
                    self.handle_delivery(delivery, &mut events);
                    self.drain_ready(&mut events);
                }
                Ok(None) | Err(_) => break,
            }
        }
        Ok(events)
    }

    fn send(
        &mut self,
        peer: PeerHandle,
        data: &[u8],
        reliability: Reliability,
    ) -> Result<(), TransportError> {
        self.ensure_alive()?;
        let outbound = self
            .peers
            .get(&peer)
            .ok_or(TransportError::UnknownPeer(peer))?;

        if !reliability.is_reliable() {
            tracing::trace!(%peer, "unreliable send delivered reliably over WebSocket");
        }
        outbound
            .send(Outbound::Data(data.to_vec()))
            .map_err(|_| TransportError::SendFailed(format!("{peer} writer has stopped")))
    }

    fn disconnect(&mut self, peer: PeerHandle) -> Result<(), TransportError> {
        self.ensure_alive()?;
        let outbound = self
            .peers
            .remove(&peer)
            .ok_or(TransportError::UnknownPeer(peer))?;

        let _ = outbound.send(Outbound::Close);
        self.local_events.push_back(RawEvent::disconnect(peer));
        Ok(())
    }

    fn peer_count(&self) -> usize {
        self.peers.len()
    }

    async fn destroy(&mut self) -> Result<(), TransportError> {
        self.ensure_alive()?;
        self.release();
        tracing::info!(local_addr = ?self.local_addr, "WebSocket host destroyed");
        Ok(())
    }
}

impl Drop for WebSocketHost {
    fn drop(&mut self) {
        if !self.destroyed {
            self.release();
        }
    }
}

fn next_peer() -> PeerHandle {
    PeerHandle::new(NEXT_PEER.fetch_add(1, Ordering::Relaxed))
}

/// One reserved connection slot on a listening host. Released on drop.
struct PeerSlot(Arc<AtomicUsize>);

impl PeerSlot {
    fn reserve(slots: &Arc<AtomicUsize>, max_peers: usize) -> Option<Self> {
        slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live < max_peers).then_some(live + 1)
            })
            .ok()
            .map(|_| Self(Arc::clone(slots)))
    }
}

impl Drop for PeerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn host_full_response() -> ErrorResponse {
    let mut response = ErrorResponse::new(Some("host is full".to_string()));
    *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
    response
}

async fn accept_loop(
    listener: TcpListener,
    inbox: mpsc::UnboundedSender<Delivery>,
    slots: Arc<AtomicUsize>,
    max_peers: usize,
) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };
        if inbox.is_closed() {
            break;
        }

        let inbox = inbox.clone();
        let slots = Arc::clone(&slots);
        tokio::spawn(async move {
            let mut slot = None;
            let handshake = tokio_tungstenite::accept_hdr_async(
                stream,
                |_: &Request, response: Response| match PeerSlot::reserve(&slots, max_peers) {
                    Some(reserved) => {
                        slot = Some(reserved);
                        Ok(response)
                    }
                    None => {
                        tracing::warn!(%addr, max_peers, "refusing connection, host is full");
                        Err(host_full_response())
                    }
                },
            )
            .await;

            match handshake {
                Ok(ws) => {
                    let peer = next_peer();
                    tracing::debug!(%peer, %addr, "accepted WebSocket connection");
                    spawn_connection(peer, ws, inbox, slot);
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "WebSocket handshake failed");
                }
            }
        });
    }
}

fn spawn_connection<S>(
    peer: PeerHandle,
    ws: WebSocketStream<S>,
    inbox: mpsc::UnboundedSender<Delivery>,
    slot: Option<PeerSlot>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut stream) = ws.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    if inbox
        .send(Delivery::Opened {
            peer,
            outbound: outbound_tx,
        })
        .is_err()
    {
        return;
    }

    let writer_inbox = inbox.clone();
    tokio::spawn(async move {
        while let Some(outbound) = outbound_rx.recv().await {
            match outbound {
                Outbound::Data(data) => {
                    if let Err(e) = sink.send(Message::Binary(data.into())).await {
                        tracing::debug!(%peer, error = %e, "WebSocket write failed");
                        break;
                    }
                }
                Outbound::Close => break,
            }
        }
        let _ = sink.close().await;
        let _ = writer_inbox.send(Delivery::Closed { peer });
    });

    tokio::spawn(async move {
        while let Some(msg) = stream.next().await {
            let payload = match msg {
                Ok(Message::Binary(data)) => data.into(),
                Ok(Message::Text(text)) => text.as_bytes().to_vec(),
                Ok(Message::Close(_)) => break,
                Ok(_) => continue, // ping/pong/raw frame
                Err(e) => {
                    tracing::debug!(%peer, error = %e, "WebSocket read failed");
                    break;
                }
            };
            if inbox.send(Delivery::Frame { peer, payload }).is_err() {
                break;
            }
        }
        // Free the slot before the host can observe the disconnect.
        drop(slot);
        let _ = inbox.send(Delivery::Closed { peer });
    });
}
