//! Session event fan-out.
//!
//! The session core never navigates anywhere itself. It publishes
//! [`SessionEvent`]s here and the top-level consumer decides what a
//! terminated session means for the user.

use pms_domain::SessionEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the broadcast buffer; slow subscribers skip older events.
const EVENT_BUFFER: usize = 16;

/// Cloneable publisher of session events.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Creates a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. Having no subscriber is not an error.
    pub fn publish(&self, event: SessionEvent) {
        if self.sender.send(event).is_err() {
            trace!("session event dropped: no subscribers");
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
