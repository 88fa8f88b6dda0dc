//! # Host context: identity and event transport for one instance.
//!
//! [`HostContext`] bundles the instance's hostname with the event [`Bus`].
//! It is passed to the [`Keeper`](crate::Keeper) at construction instead of
//! living in a process-global, so tests and multi-instance setups can build
//! as many contexts as they need.
//!
//! Two contexts sharing one `Bus` (with different hostnames) model two
//! cooperating instances: each sees the other's `LastRunUpdated` messages.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::events::{Bus, Event};

/// Identity and event transport for one scheduler instance.
///
/// Cheap to clone; clones share the underlying bus.
#[derive(Clone, Debug)]
pub struct HostContext {
    hostname: Arc<str>,
    bus: Bus,
}

impl HostContext {
    /// Creates a context for the given hostname, publishing on `bus`.
    pub fn new(hostname: impl Into<Arc<str>>, bus: Bus) -> Self {
        Self {
            hostname: hostname.into(),
            bus,
        }
    }

    /// Returns the hostname this instance identifies as.
    ///
    /// Used as the per-host key in the last-run store and stamped on
    /// outgoing synchronization messages.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Publishes an event on the shared bus.
    pub fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }

    /// Creates a new receiver observing subsequent bus events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Returns a handle to the underlying bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }
}
