//! Session lifecycle events.
//!
//! The client never navigates. When a session cannot be recovered it clears
//! the cookies and publishes [`SessionEvent::Expired`]; the hosting layer
//! decides what to do (redirect to the login route, prompt, exit).

use std::fmt;

use tokio::sync::broadcast;
use url::Url;

/// Step of the recovery sequence that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPhase {
    Refreshing,
    Retrying,
}

impl fmt::Display for RecoveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryPhase::Refreshing => f.write_str("refreshing"),
            RecoveryPhase::Retrying => f.write_str("retrying"),
        }
    }
}

/// Events published by the client about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Refresh-and-retry failed; cookies are already cleared.
    Expired {
        /// Where the user should sign in again.
        login_url: Url,
        phase: RecoveryPhase,
        /// Status of the triggering failure, if the server answered.
        status: Option<u16>,
        /// Path of the request that started the recovery.
        path: String,
    },
}

/// Broadcast hub for [`SessionEvent`]s.
///
/// Publishing with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Create a hub buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Send an event. Having no subscribers is not an error.
    pub fn publish(&self, event: SessionEvent) {
        let delivered = self.tx.send(event).unwrap_or(0);
        tracing::debug!(subscribers = delivered, "Session event published");
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(16)
    }
}
