//! Application event bus.

use tokio::sync::broadcast;
use tracing::trace;

use crate::types::{Language, TenantId};

const CHANNEL_CAPACITY: usize = 32;

/// Events published to interested listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The session was destroyed (logout, refresh failure).
    SessionExpired,
    /// A login or refresh replaced the session identity.
    UserUpdated,
    /// The selected tenant changed; `None` when it was cleared.
    TenantChanged(Option<TenantId>),
    /// The UI language changed.
    LanguageChanged(Language),
}

/// Broadcast bus for [`AppEvent`]s.
///
/// Cheap to clone; all clones publish to the same subscribers. Publishing
/// with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: AppEvent) {
        trace!(?event, "emitting event");
        // Err only means nobody is listening.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(AppEvent::SessionExpired);

        assert_eq!(rx.recv().await.unwrap(), AppEvent::SessionExpired);
    }

    #[test]
    fn emit_without_subscribers_is_fine() {
        EventBus::new().emit(AppEvent::UserUpdated);
    }
}
