//! Unified error type for gamelink.

use gamelink_protocol::ProtocolError;
use gamelink_session::SessionError;
use gamelink_transport::TransportError;

/// Top-level error wrapping every sub-crate error.
///
/// `?` converts sub-crate errors automatically through the `#[from]`
/// impls.
#[derive(Debug, thiserror::Error)]
pub enum GamelinkError {
    /// Binding, connecting, or a send the transport rejected.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encoding or decoding a typed payload.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Registry, queue, or session host errors.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl GamelinkError {
    /// Whether the session that produced this error has stopped for good.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Session(e) => e.is_fatal(),
            Self::Transport(TransportError::Destroyed) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use gamelink_protocol::{ClientId, PeerHandle};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectFailed("refused".into());
        let gamelink_err: GamelinkError = err.into();
        assert!(matches!(gamelink_err, GamelinkError::Transport(_)));
        assert!(gamelink_err.to_string().contains("refused"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidPayload("bad".into());
        let gamelink_err: GamelinkError = err.into();
        assert!(matches!(gamelink_err, GamelinkError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::ClientNotFound(ClientId(2));
        let gamelink_err: GamelinkError = err.into();
        assert!(matches!(gamelink_err, GamelinkError::Session(_)));
        assert_eq!(gamelink_err.to_string(), "client C-2 not found");
    }

    #[test]
    fn test_is_fatal() {
        assert!(GamelinkError::from(SessionError::Terminated).is_fatal());
        assert!(GamelinkError::from(TransportError::Destroyed).is_fatal());
        assert!(!GamelinkError::from(SessionError::DuplicatePeer(PeerHandle::new(1))).is_fatal());
        assert!(!GamelinkError::from(TransportError::NotClientRole).is_fatal());
    }
}
