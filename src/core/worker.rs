//! # Worker: drains the run queue until empty, then idles.
//!
//! A worker is a spawned tokio task looping `Draining ⇄ Idle` with the
//! terminal state `Terminated`:
//!
//! ```text
//! loop {
//!   while not discarded {
//!     ├─► pop queue head ── empty? ──► break to Idle
//!     ├─► confirm_run() ── false? ──► drop item, continue
//!     └─► run_once(entry)            (no queue/registry lock held here)
//!   }
//!   Idle: if discarded ──► Terminated
//!         else block on wake ── discarded while waiting ──► Terminated
//! }
//! ```
//!
//! ## Discard semantics
//! Discard is a cooperative cancellation flag checked only at loop-safe
//! points — before each dequeue and before re-entering the idle wait. A
//! worker discarded mid-item finishes that item and exits without draining
//! the rest of the queue; a worker discarded while idle exits immediately,
//! even if the queue is non-empty. The keeper replaces a discarded worker
//! with a fresh one, so a slow task never delays newly eligible work while
//! thread growth stays bounded to one straggler per replacement.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::context::HostContext;
use crate::core::queue::RunQueue;
use crate::core::runner::run_once;
use crate::store::LastRunStore;

/// State shared between a worker's loop and the keeper's handle to it.
struct WorkerShared {
    /// True while the worker is parked waiting for work.
    idle: AtomicBool,
    /// Cooperative terminate-after-current-item flag.
    discard: CancellationToken,
    /// Wakes an idle worker to resume draining.
    wake: Notify,
    /// Tag of the item currently executing, for stuck reporting.
    current: Mutex<Option<String>>,
}

/// Keeper-side handle to one worker.
pub(crate) struct WorkerHandle {
    shared: Arc<WorkerShared>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Spawns a worker that immediately starts draining `queue`.
    pub(crate) fn spawn(
        queue: Arc<RunQueue>,
        store: Arc<dyn LastRunStore>,
        ctx: HostContext,
        runtime: CancellationToken,
    ) -> Self {
        let shared = Arc::new(WorkerShared {
            idle: AtomicBool::new(false),
            discard: CancellationToken::new(),
            wake: Notify::new(),
            current: Mutex::new(None),
        });
        let join = tokio::spawn(drain_loop(Arc::clone(&shared), queue, store, ctx, runtime));
        Self { shared, join }
    }

    /// True while the worker is parked on its idle wait.
    pub(crate) fn is_idle(&self) -> bool {
        self.shared.idle.load(Ordering::SeqCst)
    }

    /// True once the worker's loop has terminated.
    pub(crate) fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Tells the worker to exit after its current item.
    pub(crate) fn discard(&self) {
        self.shared.discard.cancel();
    }

    /// Wakes the worker if it is parked.
    pub(crate) fn wake(&self) {
        self.shared.wake.notify_one();
    }

    /// Tag of the item currently executing, if any.
    pub(crate) fn current_tag(&self) -> Option<String> {
        self.shared.current.lock().unwrap().clone()
    }

    /// Waits for the worker's loop to terminate.
    pub(crate) async fn join(self) {
        let _ = self.join.await;
    }
}

async fn drain_loop(
    shared: Arc<WorkerShared>,
    queue: Arc<RunQueue>,
    store: Arc<dyn LastRunStore>,
    ctx: HostContext,
    runtime: CancellationToken,
) {
    loop {
        shared.idle.store(false, Ordering::SeqCst);

        while !shared.discard.is_cancelled() {
            let Some(entry) = queue.pop() else {
                break;
            };
            if !entry.confirm_run() {
                // the last-run time changed since this was queued
                // (external synchronization); drop the stale item
                debug!(tag = entry.tag(), "run invalidated since enqueue; dropping");
                continue;
            }
            *shared.current.lock().unwrap() = Some(entry.tag().to_string());
            run_once(&entry, store.as_ref(), &ctx, &runtime).await;
            *shared.current.lock().unwrap() = None;
        }

        shared.idle.store(true, Ordering::SeqCst);
        if shared.discard.is_cancelled() {
            // short out rather than re-entering the wait
            break;
        }

        tokio::select! {
            _ = shared.wake.notified() => {}
            _ = shared.discard.cancelled() => break,
        }
    }
    debug!("worker terminated");
}
