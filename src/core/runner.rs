//! # Run a single maintenance task to completion.
//!
//! Executes one confirmed task, publishing lifecycle events to the bus.
//!
//! ## Order of operations
//! The run-state advances *before* the body executes (write-through persist
//! plus synchronization broadcast), mirroring the completion path's
//! semantics: once an instance has committed to running a task, cooperating
//! instances should stop considering it due, and a crash mid-run does not
//! re-trigger the task immediately on restart.
//!
//! ## Event flow
//! ```text
//! update_last_run ──► LastRunUpdated (host/global scopes)
//! body starts     ──► TaskStarting
//! body Ok(())     ──► TaskStopped
//! body Err(e)     ──► TaskFailed (no retry; failures are the task's own
//!                     responsibility)
//! ```

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::HostContext;
use crate::events::{Event, EventKind};
use crate::store::LastRunStore;
use crate::tasks::TaskEntry;

/// Runs one task body, advancing its run-state first.
///
/// `runtime` is the keeper's cancellation root; the body receives a child
/// token that fires at shutdown (advisory, never preemptive).
pub(crate) async fn run_once(
    entry: &TaskEntry,
    store: &dyn LastRunStore,
    ctx: &HostContext,
    runtime: &CancellationToken,
) {
    entry.update_last_run(Utc::now(), store, ctx).await;

    ctx.publish(Event::now(EventKind::TaskStarting).with_task(entry.tag()));
    info!(tag = entry.tag(), "running maintenance task");

    match entry.task().run(runtime.child_token()).await {
        Ok(()) => {
            debug!(tag = entry.tag(), "maintenance task finished");
            ctx.publish(Event::now(EventKind::TaskStopped).with_task(entry.tag()));
        }
        Err(e) => {
            warn!(tag = entry.tag(), error = %e, "maintenance task failed");
            ctx.publish(
                Event::now(EventKind::TaskFailed)
                    .with_task(entry.tag())
                    .with_reason(e.to_string()),
            );
        }
    }
}
