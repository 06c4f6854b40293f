//! Abstract publish point for monitoring state changes.
//!
//! The core calls [`EventSink::publish`] whenever observable state changes;
//! delivery, transport, and subscriber management belong to whatever sink
//! the embedding process injects. Publishing is fire-and-forget from the
//! core's point of view; a sink that cannot deliver must not make probing
//! or detection fail.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use async_trait::async_trait;
use vigil_types::MonitorEvent;

/// Trait for event sinks.
#[async_trait]
pub trait EventSink: Clone + Send + Sync + 'static {
    /// Publishes one event. Implementations should swallow delivery
    /// problems (log and drop) rather than surface them.
    async fn publish(&self, event: MonitorEvent);
}
