//! Typed in-process event bus.

use fotodrop_core::UploadEvent;
use tokio::sync::broadcast;

pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Broadcast channel carrying domain events to every subscriber (worker
/// pool, progress broadcaster, tests). Publishing is fire-and-forget.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<UploadEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: UploadEvent) {
        let event_type = event.event_type();
        // send only errors when no subscriber exists; events are
        // best-effort notifications, so that is not a failure.
        if self.tx.send(event).is_err() {
            tracing::trace!(event_type, "upload event dropped: no subscribers");
        }
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = UploadEvent>) {
        for event in events {
            self.publish(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}
