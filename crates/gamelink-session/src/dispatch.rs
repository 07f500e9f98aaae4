//! Callback-style event consumption.
//!
//! Instead of matching on [`EventKind`] in a loop, an application can
//! implement [`EventHandler`] and hand it to [`dispatch_events`] once per
//! frame:
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use gamelink_protocol::Reliability;
//! use gamelink_session::{Event, EventHandler, SessionHost, dispatch_events};
//! use gamelink_transport::TransportHost;
//!
//! struct Relay;
//!
//! impl<T: TransportHost> EventHandler<SessionHost<T>> for Relay {
//!     fn on_receive(&mut self, host: &mut SessionHost<T>, event: Event) {
//!         if let Some(from) = event.client_id {
//!             let _ = host.broadcast_except(from, event.payload(), Reliability::Reliable);
//!         }
//!     }
//! }
//!
//! # async fn frame<T: TransportHost>(host: &mut SessionHost<T>) -> Result<(), gamelink_session::SessionError> {
//! host.tick(Duration::from_millis(16)).await?;
//! dispatch_events(host, &mut Relay);
//! # Ok(())
//! # }
//! ```

use gamelink_transport::TransportHost;

use crate::{Event, EventKind, HostClient, SessionHost};

/// A session that queues [`Event`]s.
pub trait EventSource {
    fn pop_event(&mut self) -> Option<Event>;
}

impl<T: TransportHost> EventSource for SessionHost<T> {
    fn pop_event(&mut self) -> Option<Event> {
        SessionHost::pop_event(self)
    }
}

impl<T: TransportHost> EventSource for HostClient<T> {
    fn pop_event(&mut self) -> Option<Event> {
        HostClient::pop_event(self)
    }
}

/// Reacts to events of a session `S`. Every method defaults to doing
/// nothing.
///
/// Each callback gets the session mutably, so it can reply or kick.
pub trait EventHandler<S> {
    fn on_connect(&mut self, session: &mut S, event: Event) {
        let _ = (session, event);
    }

    fn on_disconnect(&mut self, session: &mut S, event: Event) {
        let _ = (session, event);
    }

    fn on_receive(&mut self, session: &mut S, event: Event) {
        let _ = (session, event);
    }
}

/// Pops events oldest first until the queue is empty, routing each to
/// `handler`. Returns how many were dispatched.
///
/// Events queued by another consumer's push while dispatching are picked
/// up too.
pub fn dispatch_events<S, H>(session: &mut S, handler: &mut H) -> usize
where
    S: EventSource,
    H: EventHandler<S>,
{
    let mut dispatched = 0;
    while let Some(event) = session.pop_event() {
        match event.kind {
            EventKind::Connect => handler.on_connect(session, event),
            EventKind::Disconnect => handler.on_disconnect(session, event),
            EventKind::Received => handler.on_receive(session, event),
            EventKind::None => continue,
        }
        dispatched += 1;
    }
    dispatched
}
