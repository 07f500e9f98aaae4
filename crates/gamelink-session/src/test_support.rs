//! A scripted transport for unit tests.

use std::collections::VecDeque;
use std::time::Duration;

use gamelink_protocol::{PeerHandle, Reliability};
use gamelink_transport::{RawEvent, TransportError, TransportHost};

/// Replays one batch of raw events per `service` call and records
/// every send.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    batches: VecDeque<Vec<RawEvent>>,
    /// Disconnects we initiated, reported on the next `service`.
    local: Vec<RawEvent>,
    /// Handle returned by `connect`. `None` makes this a server.
    pub connect_to: Option<PeerHandle>,
    pub connected_addrs: Vec<String>,
    pub sent: Vec<(PeerHandle, Vec<u8>, Reliability)>,
    pub fail_sends_to: Vec<PeerHandle>,
    pub destroyed: bool,
}

impl ScriptedTransport {
    pub fn new(batches: Vec<Vec<RawEvent>>) -> Self {
        Self {
            batches: batches.into(),
            ..Self::default()
        }
    }

    pub fn client(server: PeerHandle, batches: Vec<Vec<RawEvent>>) -> Self {
        Self {
            connect_to: Some(server),
            ..Self::new(batches)
        }
    }

    pub fn push_batch(&mut self, batch: Vec<RawEvent>) {
        self.batches.push_back(batch);
    }

    fn ensure_alive(&self) -> Result<(), TransportError> {
        if self.destroyed {
            Err(TransportError::Destroyed)
        } else {
            Ok(())
        }
    }
}

impl TransportHost for ScriptedTransport {
    async fn connect(&mut self, addr: &str) -> Result<PeerHandle, TransportError> {
        self.ensure_alive()?;
        let peer = self.connect_to.ok_or(TransportError::NotClientRole)?;
        self.connected_addrs.push(addr.to_string());
        Ok(peer)
    }

    async fn service(&mut self, _timeout: Duration) -> Result<Vec<RawEvent>, TransportError> {
        self.ensure_alive()?;
        let mut events: Vec<RawEvent> = self.local.drain(..).collect();
        events.extend(self.batches.pop_front().unwrap_or_default());
        Ok(events)
    }

    fn send(
        &mut self,
        peer: PeerHandle,
        data: &[u8],
        reliability: Reliability,
    ) -> Result<(), TransportError> {
        self.ensure_alive()?;
        if self.fail_sends_to.contains(&peer) {
            return Err(TransportError::SendFailed(format!("{peer} scripted to fail")));
        }
        self.sent.push((peer, data.to_vec(), reliability));
        Ok(())
    }

    fn disconnect(&mut self, peer: PeerHandle) -> Result<(), TransportError> {
        self.ensure_alive()?;
        self.local.push(RawEvent::disconnect(peer));
        Ok(())
    }

    fn peer_count(&self) -> usize {
        0
    }

    async fn destroy(&mut self) -> Result<(), TransportError> {
        self.ensure_alive()?;
        self.destroyed = true;
        Ok(())
    }
}
