//! In-process event sink backed by a tokio broadcast channel, for local
//! runs and tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;
use vigil_events::EventSink;
use vigil_types::MonitorEvent;

/// Event sink that fans events out over a broadcast channel. Events
/// published while no subscriber is listening are dropped.
#[derive(Clone, Debug)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<MonitorEvent>,
}

impl BroadcastEventSink {
    /// Creates a new sink buffering up to `capacity` undelivered events per
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to all events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventSink for BroadcastEventSink {
    async fn publish(&self, event: MonitorEvent) {
        // send only errors when there are no receivers, which is fine.
        if self.sender.send(event).is_err() {
            debug!("event published with no subscribers");
        }
    }
}
