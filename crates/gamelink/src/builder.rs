//! Builders for WebSocket-backed sessions.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use gamelink::prelude::*;
//!
//! # async fn run() -> Result<(), GamelinkError> {
//! let mut server = ServerBuilder::new()
//!     .bind("0.0.0.0:7777")
//!     .max_clients(16)
//!     .build()
//!     .await?;
//!
//! let mut client = ClientBuilder::new().connect("127.0.0.1:7777").await?;
//!
//! server.tick(Duration::from_millis(10)).await?;
//! client.tick(Duration::from_millis(10)).await?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;

use gamelink_session::{HostClient, SessionConfig, SessionHost};
use gamelink_transport::{HostConfig, WebSocketHost};

use crate::GamelinkError;

/// A server session over WebSocket.
pub type GameServer = SessionHost<WebSocketHost>;

/// A client session over WebSocket.
pub type GameClient = HostClient<WebSocketHost>;

/// Builds a [`GameServer`].
#[derive(Debug, Clone)]
pub struct ServerBuilder {
    host: HostConfig,
    session: SessionConfig,
}

impl ServerBuilder {
    /// Defaults: `127.0.0.1:7777`, 32 clients, 2 channels.
    pub fn new() -> Self {
        Self {
            host: HostConfig::server("127.0.0.1:7777", HostConfig::default().max_peers),
            session: SessionConfig::default(),
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.host.bind_addr = Some(addr.to_string());
        self
    }

    /// Connections beyond this many are refused.
    pub fn max_clients(mut self, max: usize) -> Self {
        self.host.max_peers = max;
        self
    }

    pub fn channel_count(mut self, count: usize) -> Self {
        self.host.channel_count = count;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session = config;
        self
    }

    /// Binds the listener and returns the running session.
    pub async fn build(self) -> Result<GameServer, GamelinkError> {
        let transport = WebSocketHost::create(self.host).await?;
        tracing::info!(addr = ?transport.local_addr(), "game server ready");
        Ok(SessionHost::new(transport, self.session))
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a [`GameClient`] and starts connecting it.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    session: SessionConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session = config;
        self
    }

    /// Opens the connection to `addr` (`host:port`).
    ///
    /// The client reports `Connect` from its first tick. A server that is
    /// full refuses the handshake, which surfaces here as
    /// [`TransportError::ConnectFailed`](gamelink_transport::TransportError::ConnectFailed).
    pub async fn connect(self, addr: &str) -> Result<GameClient, GamelinkError> {
        let transport = WebSocketHost::create(HostConfig::client()).await?;
        let mut client = HostClient::new(transport, self.session);
        client.connect(addr).await?;
        Ok(client)
    }
}

/// The address a [`GameServer`] listens on.
pub fn local_addr(server: &GameServer) -> Option<SocketAddr> {
    server.transport().local_addr()
}

#[cfg(test)]
mod tests {
    use gamelink_session::DesyncPolicy;

    use super::*;

    #[test]
    fn test_server_builder_defaults() {
        let builder = ServerBuilder::new();
        assert_eq!(builder.host.bind_addr.as_deref(), Some("127.0.0.1:7777"));
        assert_eq!(builder.host.max_peers, 32);
        assert_eq!(builder.host.channel_count, 2);
    }

    #[test]
    fn test_server_builder_overrides() {
        let builder = ServerBuilder::new()
            .bind("0.0.0.0:9000")
            .max_clients(2)
            .channel_count(4)
            .session_config(SessionConfig::default().desync_policy(DesyncPolicy::Panic));

        assert_eq!(builder.host.bind_addr.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(builder.host.max_peers, 2);
        assert_eq!(builder.host.channel_count, 4);
        assert_eq!(builder.session.desync_policy, DesyncPolicy::Panic);
    }

    #[tokio::test]
    async fn test_build_binds_ephemeral_port() {
        let server = ServerBuilder::new().bind("127.0.0.1:0").build().await.unwrap();

        let addr = local_addr(&server).expect("bound");
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_build_address_in_use_fails() {
        let first = ServerBuilder::new().bind("127.0.0.1:0").build().await.unwrap();
        let taken = local_addr(&first).unwrap().to_string();

        let result = ServerBuilder::new().bind(&taken).build().await;

        assert!(matches!(result, Err(GamelinkError::Transport(_))));
    }
}
