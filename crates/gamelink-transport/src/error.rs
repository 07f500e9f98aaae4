use crate::PeerHandle;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// Another host already listens on this address.
    #[error("address {0} already in use")]
    AddressInUse(String),

    /// Establishing an outgoing connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// `connect` was called on a listening host.
    #[error("only client hosts can connect outward")]
    NotClientRole,

    /// The peer handle is not connected to this host.
    #[error("unknown peer {0}")]
    UnknownPeer(PeerHandle),

    /// The peer's outbound channel is gone.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The host was destroyed.
    #[error("host destroyed")]
    Destroyed,
}
