//! Session configuration.

use std::num::NonZeroUsize;

/// What a host does when the registry and the transport diverge.
///
/// Divergence means the transport reported a connect for a peer that is
/// already registered, or a disconnect for one that never was. Continuing
/// would risk attaching one client's traffic to another's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DesyncPolicy {
    /// Log, mark the host failed and return
    /// [`SessionError::Desynchronized`](crate::SessionError::Desynchronized).
    /// The host refuses further ticks and sends.
    #[default]
    Terminate,
    /// Panic on the spot. Meant for development builds and tests.
    Panic,
}

/// Configuration for [`SessionHost`](crate::SessionHost) and
/// [`HostClient`](crate::HostClient).
///
/// # Example
///
/// ```rust
/// use std::num::NonZeroUsize;
///
/// use gamelink_session::{DesyncPolicy, SessionConfig};
///
/// let limit = NonZeroUsize::new(64).ok_or("zero limit")?;
/// let config = SessionConfig::default()
///     .desync_policy(DesyncPolicy::Panic)
///     .max_events_per_tick(limit);
/// assert_eq!(config.max_events_per_tick, Some(limit));
/// # Ok::<(), &str>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub desync_policy: DesyncPolicy,

    /// Upper bound on raw events processed by one tick. Events past the
    /// bound stay with the session and are processed by the next tick.
    /// `None` processes everything the transport returns. Never zero, so
    /// every tick makes progress on the backlog.
    pub max_events_per_tick: Option<NonZeroUsize>,
}

impl SessionConfig {
    pub fn desync_policy(mut self, policy: DesyncPolicy) -> Self {
        self.desync_policy = policy;
        self
    }

    pub fn max_events_per_tick(mut self, max: NonZeroUsize) -> Self {
        self.max_events_per_tick = Some(max);
        self
    }
}
