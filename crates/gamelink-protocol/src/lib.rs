//! Envelope and identity types for gamelink.
//!
//! - **Identity** ([`ClientId`]): the stable, session-long name the
//!   session layer gives each connected party.
//! - **Envelope** ([`Packet`]): a payload plus the addressing and
//!   reliability metadata needed to send it or to say where it came from.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): optional helpers for
//!   applications that want typed messages inside the opaque payload.
//! - **Errors** ([`ProtocolError`]).
//!
//! The session layer treats payloads as opaque bytes. Nothing here
//! defines a wire format for them.
//!
//! ```text
//! Transport (bytes, peer handles) → Protocol (Packet, ClientId) → Session
//! ```

mod codec;
mod error;
mod packet;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use packet::{ClientId, Packet};

pub use gamelink_transport::{PeerHandle, Reliability};
