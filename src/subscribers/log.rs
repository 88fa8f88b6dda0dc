//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] renders bus events through `tracing`. This is primarily
//! useful for development and examples; production deployments usually
//! implement their own [`Subscribe`] for structured export.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Renders every bus event as a tracing record.
///
/// Enabled via the `logging` feature.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TaskRegistered => {
                info!(seq = e.seq, task = ?e.task, "task registered");
            }
            EventKind::TaskQueued => {
                debug!(seq = e.seq, task = ?e.task, "task queued");
            }
            EventKind::TaskStarting => {
                info!(seq = e.seq, task = ?e.task, "task starting");
            }
            EventKind::TaskStopped => {
                info!(seq = e.seq, task = ?e.task, "task stopped");
            }
            EventKind::TaskFailed => {
                warn!(seq = e.seq, task = ?e.task, reason = ?e.reason, "task failed");
            }
            EventKind::WorkerSpawned => {
                debug!(seq = e.seq, "worker spawned");
            }
            EventKind::WorkerDiscarded => {
                debug!(seq = e.seq, "worker discarded");
            }
            EventKind::LastRunUpdated => {
                debug!(
                    seq = e.seq,
                    task = ?e.task,
                    host = ?e.host,
                    last_run = ?e.last_run,
                    "last-run updated"
                );
            }
            EventKind::ShutdownRequested => {
                info!(seq = e.seq, "shutdown requested");
            }
            EventKind::GraceExceeded => {
                warn!(seq = e.seq, "shutdown grace exceeded");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
