//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] — an extension point for plugging custom event
//! handlers (logging, metrics, alerting) into the runtime.
//!
//! Attach a subscriber with [`attach`](super::attach): it gets a dedicated
//! worker task reading the bus and sees events in publish order. A slow
//! subscriber lags behind the bus ring buffer rather than blocking
//! publishers; skipped events are surfaced through the receiver's lag
//! error, not silently lost.

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for runtime observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Falling behind only costs this subscriber events, never the keeper.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from the subscriber's own worker task, never from the
    /// publisher's context.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in logs.
    ///
    /// Prefer short, descriptive names (e.g., "metrics", "audit").
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
