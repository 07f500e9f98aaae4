//! Thread-safe double-ended event queue.
//!
//! The session's polling loop is the only producer. Any number of
//! consumers, tasks or plain OS threads, drain it through a shared
//! `Arc<EventQueue>`. One mutex guards the whole deque; contention is
//! bounded by tick rate, and no lock is ever held across an `.await`.
//!
//! The session pushes to the back and [`pop_event`](crate::SessionHost::pop_event)
//! pops from the front, so the default discipline is strict FIFO. Both
//! ends stay available for callers that want something else.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{Event, SessionError};

/// An unbounded, mutex-guarded deque of [`Event`]s.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<Event>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // The deque holds plain values, so a panic in another holder cannot
    // leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push_front(&self, event: Event) {
        self.lock().push_front(event);
    }

    pub fn push_back(&self, event: Event) {
        self.lock().push_back(event);
    }

    /// # Errors
    /// [`SessionError::QueueEmpty`] if there is nothing to pop.
    pub fn pop_front(&self) -> Result<Event, SessionError> {
        self.lock().pop_front().ok_or(SessionError::QueueEmpty)
    }

    /// # Errors
    /// [`SessionError::QueueEmpty`] if there is nothing to pop.
    pub fn pop_back(&self) -> Result<Event, SessionError> {
        self.lock().pop_back().ok_or(SessionError::QueueEmpty)
    }

    /// Pops from the front, or `None` when empty.
    ///
    /// Prefer this over checking [`is_empty`](Self::is_empty) first: with
    /// several consumers the queue can empty between the two calls.
    pub fn try_pop(&self) -> Option<Event> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every pending event.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Takes every pending event at once, front to back.
    pub fn drain(&self) -> Vec<Event> {
        self.lock().drain(..).collect()
    }
}
