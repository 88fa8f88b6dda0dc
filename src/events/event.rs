//! # Runtime events emitted by the keeper and its workers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Registry events**: task registration and queueing
//! - **Execution events**: worker lifecycle and task run outcomes
//! - **Synchronization events**: last-run convergence across instances
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! task tags, hostnames, and last-run times.
//!
//! [`EventKind::LastRunUpdated`] is special: besides observability it is the
//! wire format of the advisory synchronization channel. Cooperating
//! instances that share a bus (or bridge their buses over a transport)
//! apply received `LastRunUpdated` events to their own registries so that
//! host- and global-scoped tasks converge on the same last-run time.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore order when events are observed out
//! of order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{DateTime, Utc};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Registry events ===
    /// A task was accepted into the registry.
    ///
    /// Sets: `task`.
    TaskRegistered,

    /// A task passed its eligibility check and was appended to the run queue.
    ///
    /// Sets: `task`.
    TaskQueued,

    // === Execution events ===
    /// A worker is about to execute a queued task.
    ///
    /// Sets: `task`.
    TaskStarting,

    /// A task body finished successfully.
    ///
    /// Sets: `task`.
    TaskStopped,

    /// A task body returned an error. The worker does not retry.
    ///
    /// Sets: `task`, `reason`.
    TaskFailed,

    /// A fresh worker was spawned (initial, or replacing a busy one).
    WorkerSpawned,

    /// A busy worker was told to finish its current item and exit.
    WorkerDiscarded,

    // === Synchronization events ===
    /// A task's last-run time advanced. This is the synchronization message:
    /// registered tasks on cooperating instances apply it directly,
    /// bypassing the normal run-completion path.
    ///
    /// Sets: `task`, `host`, `last_run`.
    LastRunUpdated,

    // === Shutdown events ===
    /// Keeper shutdown has begun; queued-but-unstarted items are released.
    ShutdownRequested,

    /// Shutdown grace expired with workers still executing.
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: DateTime<Utc>,
    /// Event classification.
    pub kind: EventKind,
    /// Tag of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Hostname of the instance that emitted the event, for sync messages.
    pub host: Option<Arc<str>>,
    /// New last-run timestamp, for sync messages.
    pub last_run: Option<DateTime<Utc>>,
    /// Human-readable reason (task failure details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: Utc::now(),
            kind,
            task: None,
            host: None,
            last_run: None,
            reason: None,
        }
    }

    /// Attaches a task tag.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches the emitting hostname.
    #[inline]
    pub fn with_host(mut self, host: impl Into<Arc<str>>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Attaches a last-run timestamp.
    #[inline]
    pub fn with_last_run(mut self, last_run: DateTime<Utc>) -> Self {
        self.last_run = Some(last_run);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a synchronization message announcing a new last-run time.
    #[inline]
    pub fn last_run_updated(
        host: impl Into<Arc<str>>,
        task: impl Into<Arc<str>>,
        last_run: DateTime<Utc>,
    ) -> Self {
        Event::now(EventKind::LastRunUpdated)
            .with_host(host)
            .with_task(task)
            .with_last_run(last_run)
    }

    /// Returns true if this event is a synchronization message.
    #[inline]
    pub fn is_sync(&self) -> bool {
        matches!(self.kind, EventKind::LastRunUpdated)
    }
}
