//! The client registry: sole authority over [`ClientId`] allocation.
//!
//! Clients live by value in a `Vec` indexed by their id, so lookup by id
//! is a bounds check. A second map resolves transport peer handles to
//! ids and only ever holds connected clients.
//!
//! ```text
//! add_client(peer)        → clients.push(..), by_peer[peer] = id
//! disconnect_client(peer) → clients[id].state = Disconnected, by_peer.remove(peer)
//! ```
//!
//! Ids are dense and never reused: a disconnected client keeps its slot
//! so stale ids can still be looked up and are never handed to someone
//! else.

use std::collections::HashMap;

use gamelink_protocol::{ClientId, PeerHandle};

use crate::{Client, Connectable, SessionError, names};

/// Maps transport peer handles to application clients.
///
/// Not synchronized. The session host owns it and is its only writer.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Vec<Client>,
    by_peer: HashMap<PeerHandle, ClientId>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly connected peer and returns its client, already
    /// in the `Connected` state.
    ///
    /// A peer whose earlier client has disconnected gets a brand new
    /// client with a new id.
    ///
    /// # Errors
    /// - [`SessionError::DuplicatePeer`] if `peer` already has a connected
    ///   client.
    /// - [`SessionError::ClientIdsExhausted`] once every `u32` id has been
    ///   handed out.
    ///
    /// The registry is left untouched on error.
    pub fn add_client(&mut self, peer: PeerHandle) -> Result<&Client, SessionError> {
        if self.by_peer.contains_key(&peer) {
            return Err(SessionError::DuplicatePeer(peer));
        }

        let id = next_id(self.clients.len())?;
        let mut client = Client::new(id, names::client_name(peer), peer);
        client.connect()?;

        self.clients.push(client);
        self.by_peer.insert(peer, id);

        let client = &self.clients[id.index()];
        tracing::debug!(client_id = %id, %peer, name = client.name(), "client registered");
        Ok(client)
    }

    /// Marks the client on `peer` as disconnected and forgets the peer
    /// handle. The client stays retrievable by id.
    ///
    /// # Errors
    /// [`SessionError::PeerNotFound`] if no connected client is
    /// registered for `peer`.
    pub fn disconnect_client(&mut self, peer: PeerHandle) -> Result<&Client, SessionError> {
        let id = self
            .by_peer
            .remove(&peer)
            .ok_or(SessionError::PeerNotFound(peer))?;

        let client = &mut self.clients[id.index()];
        client.disconnect()?;
        tracing::debug!(client_id = %id, %peer, "client unregistered");
        Ok(client)
    }

    /// The connected client on `peer`, if any.
    pub fn get_by_peer(&self, peer: PeerHandle) -> Option<&Client> {
        self.by_peer
            .get(&peer)
            .map(|id| &self.clients[id.index()])
    }

    /// The client with `id`, connected or not.
    pub fn get_by_id(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(id.index())
    }

    /// Every client ever registered, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter()
    }

    pub fn connected(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter().filter(|c| c.is_connected())
    }

    pub fn connected_count(&self) -> usize {
        self.by_peer.len()
    }

    /// Number of clients ever registered. Also the next id to allocate.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// The id for the client stored at slot `len`.
fn next_id(len: usize) -> Result<ClientId, SessionError> {
    u32::try_from(len)
        .map(ClientId)
        .map_err(|_| SessionError::ClientIdsExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientState;

    fn peer(raw: u64) -> PeerHandle {
        PeerHandle::new(raw)
    }

    // ---------------------------------------------------------------
    // add_client
    // ---------------------------------------------------------------

    #[test]
    fn test_add_client_assigns_dense_ids_from_zero() {
        let mut registry = ClientRegistry::new();

        let a = registry.add_client(peer(10)).unwrap().id();
        let b = registry.add_client(peer(20)).unwrap().id();
        let c = registry.add_client(peer(30)).unwrap().id();

        assert_eq!((a, b, c), (ClientId(0), ClientId(1), ClientId(2)));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_add_client_returns_connected_client() {
        let mut registry = ClientRegistry::new();

        let client = registry.add_client(peer(10)).unwrap();

        assert_eq!(client.state(), ClientState::Connected);
        assert_eq!(client.peer(), peer(10));
        assert!(!client.name().is_empty());
    }

    #[test]
    fn test_add_client_duplicate_live_peer_returns_error() {
        let mut registry = ClientRegistry::new();
        registry.add_client(peer(10)).unwrap();

        let result = registry.add_client(peer(10));

        assert!(matches!(result, Err(SessionError::DuplicatePeer(p)) if p == peer(10)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.connected_count(), 1);
    }

    #[test]
    fn test_next_id_follows_slot_count() {
        assert_eq!(next_id(0).unwrap(), ClientId(0));
        assert_eq!(next_id(u32::MAX as usize).unwrap(), ClientId(u32::MAX));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_next_id_past_u32_returns_exhausted() {
        let result = next_id(u32::MAX as usize + 1);
        assert!(matches!(result, Err(SessionError::ClientIdsExhausted)));
    }

    #[test]
    fn test_add_client_ids_not_reused_after_disconnect() {
        let mut registry = ClientRegistry::new();
        registry.add_client(peer(10)).unwrap();
        registry.disconnect_client(peer(10)).unwrap();

        let next = registry.add_client(peer(20)).unwrap().id();

        assert_eq!(next, ClientId(1));
    }

    #[test]
    fn test_add_client_same_peer_after_disconnect_creates_new_client() {
        let mut registry = ClientRegistry::new();
        registry.add_client(peer(10)).unwrap();
        registry.disconnect_client(peer(10)).unwrap();

        let again = registry.add_client(peer(10)).unwrap().id();

        assert_eq!(again, ClientId(1));
        assert_eq!(registry.get_by_peer(peer(10)).unwrap().id(), ClientId(1));
        assert_eq!(
            registry.get_by_id(ClientId(0)).unwrap().state(),
            ClientState::Disconnected
        );
    }

    // ---------------------------------------------------------------
    // disconnect_client
    // ---------------------------------------------------------------

    #[test]
    fn test_disconnect_client_keeps_record_by_id() {
        let mut registry = ClientRegistry::new();
        registry.add_client(peer(10)).unwrap();

        let client = registry.disconnect_client(peer(10)).unwrap();
        assert_eq!(client.state(), ClientState::Disconnected);

        assert!(registry.get_by_peer(peer(10)).is_none());
        let by_id = registry.get_by_id(ClientId(0)).unwrap();
        assert_eq!(by_id.state(), ClientState::Disconnected);
        assert_eq!(registry.connected_count(), 0);
    }

    #[test]
    fn test_disconnect_client_unknown_peer_returns_error() {
        let mut registry = ClientRegistry::new();

        let result = registry.disconnect_client(peer(99));

        assert!(matches!(result, Err(SessionError::PeerNotFound(_))));
    }

    #[test]
    fn test_disconnect_client_twice_returns_error() {
        let mut registry = ClientRegistry::new();
        registry.add_client(peer(10)).unwrap();
        registry.disconnect_client(peer(10)).unwrap();

        assert!(matches!(
            registry.disconnect_client(peer(10)),
            Err(SessionError::PeerNotFound(_))
        ));
    }

    // ---------------------------------------------------------------
    // lookups
    // ---------------------------------------------------------------

    #[test]
    fn test_get_by_id_out_of_range_returns_none() {
        let registry = ClientRegistry::new();
        assert!(registry.get_by_id(ClientId(0)).is_none());
        assert!(registry.get_by_id(ClientId(u32::MAX)).is_none());
    }

    #[test]
    fn test_connected_skips_disconnected_clients() {
        let mut registry = ClientRegistry::new();
        registry.add_client(peer(1)).unwrap();
        registry.add_client(peer(2)).unwrap();
        registry.add_client(peer(3)).unwrap();
        registry.disconnect_client(peer(2)).unwrap();

        let ids: Vec<_> = registry.connected().map(Client::id).collect();

        assert_eq!(ids, vec![ClientId(0), ClientId(2)]);
        assert_eq!(registry.iter().count(), 3);
    }
}
