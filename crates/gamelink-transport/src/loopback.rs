//! In-process transport binding.
//!
//! A [`LoopbackNetwork`] is a registry of listening addresses shared by
//! every host created from it. Hosts exchange deliveries over
//! unbounded Tokio channels, so a server and any number of clients can
//! run inside one process (or one test) with real connect/accept,
//! capacity and disconnect semantics.
//!
//! ```text
//!  client host                         server host
//!  connect(addr) ── Incoming ────────→ service(): accept or refuse
//!  service()     ←──────── Accepted ── (or Closed when full)
//!  send()        ── Datagram ────────→ service(): Receive
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;

use crate::{
    HostConfig, PeerHandle, RawEvent, Reliability, TransportError,
    TransportHost,
};

/// Tuning for the loopback binding.
#[derive(Debug, Clone, Default)]
pub struct LoopbackConfig {
    /// Probability (0.0–1.0) that an unreliable send is silently dropped.
    pub unreliable_loss: f64,
}

/// Messages travelling between loopback hosts.
enum Delivery {
    /// A remote host wants to connect. `peer` is our handle for it.
    Incoming { peer: PeerHandle, link: Link },
    /// Our pending connect to `peer` was accepted.
    Accepted { peer: PeerHandle },
    Datagram { peer: PeerHandle, payload: Vec<u8> },
    Closed { peer: PeerHandle },
}

/// Our way of reaching a remote host.
#[derive(Clone)]
struct Link {
    remote: mpsc::UnboundedSender<Delivery>,
    /// The handle the remote host uses for us.
    remote_peer: PeerHandle,
}

struct NetworkInner {
    listeners: Mutex<HashMap<String, mpsc::UnboundedSender<Delivery>>>,
    next_peer: AtomicU64,
    unreliable_loss: f64,
}

/// A set of in-process hosts that can reach each other by address.
///
/// Cheap to clone; clones share the same address space.
#[derive(Clone)]
pub struct LoopbackNetwork {
    inner: Arc<NetworkInner>,
}

impl LoopbackNetwork {
    pub fn new(config: LoopbackConfig) -> Self {
        Self {
            inner: Arc::new(NetworkInner {
                listeners: Mutex::new(HashMap::new()),
                next_peer: AtomicU64::new(1),
                unreliable_loss: config.unreliable_loss.clamp(0.0, 1.0),
            }),
        }
    }

    /// Creates a host on this network.
    ///
    /// With a `bind_addr` the host listens on it; the address must not
    /// be taken by another live host.
    pub fn create_host(
        &self,
        config: HostConfig,
    ) -> Result<LoopbackHost, TransportError> {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();

        if let Some(addr) = &config.bind_addr {
            let mut listeners = self.listeners();
            if listeners.contains_key(addr) {
                return Err(TransportError::AddressInUse(addr.clone()));
            }
            listeners.insert(addr.clone(), inbox_tx.clone());
            tracing::info!(%addr, max_peers = config.max_peers, "loopback host listening");
        }

        Ok(LoopbackHost {
            network: self.clone(),
            config,
            inbox,
            inbox_tx,
            peers: HashMap::new(),
            pending: HashMap::new(),
            local_events: VecDeque::new(),
            destroyed: false,
        })
    }

    fn listeners(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, mpsc::UnboundedSender<Delivery>>>
    {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn next_peer(&self) -> PeerHandle {
        PeerHandle::new(self.inner.next_peer.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for LoopbackNetwork {
    fn default() -> Self {
        Self::new(LoopbackConfig::default())
    }
}

/// A host on a [`LoopbackNetwork`].
pub struct LoopbackHost {
    network: LoopbackNetwork,
    config: HostConfig,
    inbox: mpsc::UnboundedReceiver<Delivery>,
    inbox_tx: mpsc::UnboundedSender<Delivery>,
    peers: HashMap<PeerHandle, Link>,
    /// Outgoing connects waiting for the server's answer.
    pending: HashMap<PeerHandle, Link>,
    /// Events produced by our own calls (local disconnects).
    local_events: VecDeque<RawEvent>,
    destroyed: bool,
}

impl LoopbackHost {
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
            Delivery::Incoming { peer, link } => {
                if self.peers.len() >= self.config.max_peers {
                    tracing::warn!(
                        %peer,
                        max_peers = self.config.max_peers,
                        "refusing connect, host is full"
                    );
                    let _ = link.remote.send(Delivery::Closed {
                        peer: link.remote_peer,
                    });
                    return;
                }
                let _ = link.remote.send(Delivery::Accepted {
                    peer: link.remote_peer,
                });
                self.peers.insert(peer, link);
                events.push(RawEvent::connect(peer));
            }
            Delivery::Accepted { peer } => {
                if let Some(link) = self.pending.remove(&peer) {
                    self.peers.insert(peer, link);
                    events.push(RawEvent::connect(peer));
                }
            }
            Delivery::Datagram { peer, payload } => {
                if self.peers.contains_key(&peer) {
                    events.push(RawEvent::receive(peer, payload));
                } else {
                    tracing::trace!(%peer, "dropping datagram from closed peer");
                }
            }
            Delivery::Closed { peer } => {
                let known = self.peers.remove(&peer).is_some()
                    || self.pending.remove(&peer).is_some();
                if known {
                    events.push(RawEvent::disconnect(peer));
                }
            }
        }
    }

    /// Tells every remote we are gone and frees our listening address.
    fn release(&mut self) {
        for (_, link) in self.peers.drain().chain(self.pending.drain()) {
            let _ = link.remote.send(Delivery::Closed {
                peer: link.remote_peer,
            });
        }
        if let Some(addr) = &self.config.bind_addr {
            self.network.listeners().remove(addr);
        }
        self.local_events.clear();
        self.destroyed = true;
    }
}

impl TransportHost for LoopbackHost {
    async fn connect(&mut self, addr: &str) -> Result<PeerHandle, TransportError> {
        self.ensure_alive()?;
        if self.config.is_server() {
            return Err(TransportError::NotClientRole);
        }
        if self.peers.len() + self.pending.len() >= self.config.max_peers {
            return Err(TransportError::ConnectFailed(format!(
                "host already has {} peer(s)",
                self.config.max_peers
            )));
        }

        let listener = self
            .network
            .listeners()
            .get(addr)
            .cloned()
            .ok_or_else(|| {
                TransportError::ConnectFailed(format!("nothing listening on {addr}"))
            })?;

        let local = self.network.next_peer();
        let remote = self.network.next_peer();
        listener
            .send(Delivery::Incoming {
                peer: remote,
                link: Link {
                    remote: self.inbox_tx.clone(),
                    remote_peer: local,
                },
            })
            .map_err(|_| {
                TransportError::ConnectFailed(format!("{addr} stopped listening"))
            })?;

        self.pending.insert(
            local,
            Link {
                remote: listener,
                remote_peer: remote,
            },
        );
        tracing::debug!(addr, peer = %local, "loopback connect started");
        Ok(local)
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

        // Some deliveries produce no event (refused connects, stale
        // datagrams), so keep waiting until the deadline.
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
        let link = self
            .peers
            .get(&peer)
            .ok_or(TransportError::UnknownPeer(peer))?;

        let loss = self.network.inner.unreliable_loss;
        if !reliability.is_reliable() && loss > 0.0 && rand::rng().random_bool(loss) {
            tracing::trace!(%peer, len = data.len(), "simulated loss");
            return Ok(());
        }

        link.remote
            .send(Delivery::Datagram {
                peer: link.remote_peer,
                payload: data.to_vec(),
            })
            .map_err(|_| TransportError::SendFailed(format!("{peer} is gone")))
    }

    fn disconnect(&mut self, peer: PeerHandle) -> Result<(), TransportError> {
        self.ensure_alive()?;
        let link = self
            .peers
            .remove(&peer)
            .or_else(|| self.pending.remove(&peer))
            .ok_or(TransportError::UnknownPeer(peer))?;

        let _ = link.remote.send(Delivery::Closed {
            peer: link.remote_peer,
        });
        self.local_events.push_back(RawEvent::disconnect(peer));
        Ok(())
    }

    fn peer_count(&self) -> usize {
        self.peers.len()
    }

    async fn destroy(&mut self) -> Result<(), TransportError> {
        self.ensure_alive()?;
        self.release();
        tracing::info!(addr = ?self.config.bind_addr, "loopback host destroyed");
        Ok(())
    }
}

impl Drop for LoopbackHost {
    fn drop(&mut self) {
        if !self.destroyed {
            self.release();
        }
    }
}
