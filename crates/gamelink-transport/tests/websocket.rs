//! Integration tests for the WebSocket binding.
//!
//! These bind a real listener on an OS-assigned port and connect a
//! client host to it, so frames cross an actual TCP socket.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use gamelink_transport::{
        HostConfig, PeerHandle, RawEvent, RawEventKind, Reliability,
        TransportError, TransportHost, WebSocketHost,
    };

    const WAIT: Duration = Duration::from_secs(5);

    async fn server(max_peers: usize) -> (WebSocketHost, String) {
        let host = WebSocketHost::create(HostConfig::server("127.0.0.1:0", max_peers))
            .await
            .expect("should bind");
        let addr = host.local_addr().expect("server has an address").to_string();
        (host, addr)
    }

    async fn client() -> WebSocketHost {
        WebSocketHost::create(HostConfig::client())
            .await
            .expect("client host")
    }

    /// Services `host` until it reports an event of `kind`.
    async fn next_event(host: &mut WebSocketHost, kind: RawEventKind) -> RawEvent {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            let events = host.service(Duration::from_millis(100)).await.expect("service");
            if let Some(event) = events.into_iter().find(|e| e.kind == kind) {
                return event;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {kind}"
            );
        }
    }

    async fn connected_pair() -> (WebSocketHost, WebSocketHost, PeerHandle, PeerHandle) {
        let (mut srv, addr) = server(4).await;
        let mut cli = client().await;

        let server_peer = cli.connect(&addr).await.expect("connect");
        let client_peer = next_event(&mut srv, RawEventKind::Connect).await.peer;
        let connected = next_event(&mut cli, RawEventKind::Connect).await;
        assert_eq!(connected.peer, server_peer);

        (srv, cli, client_peer, server_peer)
    }

    #[tokio::test]
    async fn test_websocket_connect_and_exchange_payloads() {
        let (mut srv, mut cli, client_peer, server_peer) = connected_pair().await;

        srv.send(client_peer, b"hello from server", Reliability::Reliable)
            .expect("server send");
        let at_client = next_event(&mut cli, RawEventKind::Receive).await;
        assert_eq!(at_client.peer, server_peer);
        assert_eq!(at_client.payload, b"hello from server");

        cli.send(server_peer, b"hello from client", Reliability::Unreliable)
            .expect("client send");
        let at_server = next_event(&mut srv, RawEventKind::Receive).await;
        assert_eq!(at_server.peer, client_peer);
        assert_eq!(at_server.payload, b"hello from client");
    }

    #[tokio::test]
    async fn test_websocket_disconnect_reaches_both_sides() {
        let (mut srv, mut cli, client_peer, server_peer) = connected_pair().await;

        cli.disconnect(server_peer).expect("disconnect");

        let local = next_event(&mut cli, RawEventKind::Disconnect).await;
        assert_eq!(local.peer, server_peer);
        let remote = next_event(&mut srv, RawEventKind::Disconnect).await;
        assert_eq!(remote.peer, client_peer);
        assert_eq!(srv.peer_count(), 0);
    }

    #[tokio::test]
    async fn test_websocket_connect_from_server_is_rejected() {
        let (mut srv, addr) = server(1).await;

        let result = srv.connect(&addr).await;

        assert!(matches!(result, Err(TransportError::NotClientRole)));
    }

    #[tokio::test]
    async fn test_websocket_connect_to_closed_port_fails() {
        let (mut srv, addr) = server(1).await;
        srv.destroy().await.expect("destroy");
        drop(srv);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut cli = client().await;
        let result = cli.connect(&addr).await;

        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
    }

    #[tokio::test]
    async fn test_websocket_connect_beyond_max_peers_fails_handshake() {
        let (mut srv, addr) = server(1).await;
        let mut first = client().await;
        let first_peer = first.connect(&addr).await.expect("first connect");
        next_event(&mut srv, RawEventKind::Connect).await;

        let mut late = client().await;
        let result = late.connect(&addr).await;

        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
        assert_eq!(late.peer_count(), 0);
        assert!(late.service(Duration::from_millis(50)).await.unwrap().is_empty());
        assert!(srv.service(Duration::from_millis(50)).await.unwrap().is_empty());
        assert_eq!(srv.peer_count(), 1);

        // A freed slot admits the next connect.
        first.disconnect(first_peer).expect("disconnect");
        next_event(&mut srv, RawEventKind::Disconnect).await;
        late.connect(&addr).await.expect("retry connects");
        next_event(&mut srv, RawEventKind::Connect).await;
        assert_eq!(srv.peer_count(), 1);
    }

    #[tokio::test]
    async fn test_websocket_destroy_disconnects_clients() {
        let (mut srv, mut cli, _, server_peer) = connected_pair().await;

        srv.destroy().await.expect("destroy");

        let event = next_event(&mut cli, RawEventKind::Disconnect).await;
        assert_eq!(event.peer, server_peer);
        assert!(matches!(
            srv.service(Duration::ZERO).await,
            Err(TransportError::Destroyed)
        ));
    }
}
