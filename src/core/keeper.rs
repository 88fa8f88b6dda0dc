//! # Keeper: orchestrates the registry, the run queue, and the workers.
//!
//! The [`Keeper`] owns every registered [`TaskEntry`], the FIFO
//! [`RunQueue`], and an ordered list of workers (index 0 = primary). It is
//! driven by a periodic tick — internal by default, or external when
//! [`Config::tick_interval`] is zero — and exposes `register` / `start` /
//! `tick` / `shutdown`.
//!
//! ## High-level architecture
//! ```text
//! timer ──► tick(now)
//!             ├─► for each entry (registry order): check_run(now)?
//!             │        └─ eligible ──► queue.push(entry)   [+ TaskQueued]
//!             ├─► queue non-empty ──► ensure_worker()
//!             │        ├─ none        ──► spawn primary
//!             │        ├─ primary idle ──► wake it
//!             │        └─ primary busy ──► discard it, spawn replacement
//!             │                            in front (straggler finishes its
//!             │                            current item, then terminates)
//!             └─► reap terminated non-primary workers
//!
//! bus ──► sync listener: LastRunUpdated{host, tag, ts}
//!             └─ tag registered? ──► set_last_run(ts)  (bypasses the
//!                completion path; clears the pending confirmation)
//! ```
//!
//! ## Locking
//! The registry, the queue, and the worker list sit behind independent
//! locks, none of which is held while a task body runs. `tick` only locks,
//! enqueues, and signals — it never blocks on worker completion, so a slow
//! task cannot delay the evaluation of newly eligible tasks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, MissedTickBehavior, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::context::HostContext;
use crate::core::queue::RunQueue;
use crate::core::runner::run_once;
use crate::core::worker::WorkerHandle;
use crate::error::RuntimeError;
use crate::events::{Event, EventKind};
use crate::store::LastRunStore;
use crate::tasks::{Scope, TaskEntry, TaskSpec};

/// Background maintenance-task scheduler for one service instance.
///
/// Construct with [`Keeper::new`], register specs, then [`start`](Self::start).
pub struct Keeper {
    cfg: Config,
    ctx: HostContext,
    store: Arc<dyn LastRunStore>,
    /// Registry: tag → entry, iterated in tag order.
    tasks: Mutex<BTreeMap<String, Arc<TaskEntry>>>,
    queue: Arc<RunQueue>,
    /// Ordered worker list; index 0 is the primary (freshest) drainer,
    /// later entries are discarded stragglers awaiting reap.
    workers: Mutex<Vec<WorkerHandle>>,
    rng: Mutex<StdRng>,
    runtime: CancellationToken,
    started: AtomicBool,
}

impl Keeper {
    /// Creates a keeper with the given configuration, host context, and
    /// last-run store.
    pub fn new(cfg: Config, ctx: HostContext, store: Arc<dyn LastRunStore>) -> Arc<Self> {
        let rng = match cfg.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Arc::new(Self {
            cfg,
            ctx,
            store,
            tasks: Mutex::new(BTreeMap::new()),
            queue: Arc::new(RunQueue::new()),
            workers: Mutex::new(Vec::new()),
            rng: Mutex::new(rng),
            runtime: CancellationToken::new(),
            started: AtomicBool::new(false),
        })
    }

    /// Registers a task. First registration wins: a spec whose tag is
    /// already taken is rejected (and dropped) with a logged error.
    ///
    /// Register tasks before [`start`](Self::start); a task registered
    /// later joins the next tick but begins with no run history until its
    /// first completion.
    pub fn register(&self, spec: TaskSpec) -> Result<(), RuntimeError> {
        let tag = spec.tag().to_string();
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.contains_key(&tag) {
            error!(tag = %tag, "task already registered; rejecting duplicate");
            return Err(RuntimeError::DuplicateTag { tag });
        }
        info!(tag = %tag, "registering maintenance task");
        tasks.insert(tag.clone(), Arc::new(TaskEntry::new(spec)));
        drop(tasks);
        self.ctx
            .publish(Event::now(EventKind::TaskRegistered).with_task(tag));
        Ok(())
    }

    /// Returns the registry entry for `tag`, if registered.
    pub fn entry(&self, tag: &str) -> Option<Arc<TaskEntry>> {
        self.tasks.lock().unwrap().get(tag).cloned()
    }

    /// Returns the registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        self.tasks.lock().unwrap().keys().cloned().collect()
    }

    /// Starts the keeper:
    ///
    /// 1. loads persisted last-run times for host- and global-scoped tasks
    ///    (a load failure leaves the task as "never run", non-fatal);
    /// 2. subscribes to bus synchronization messages;
    /// 3. runs `StartupPolicy::Immediate` tasks synchronously, before
    ///    returning;
    /// 4. queues `StartupPolicy::OnStartup` tasks and ensures a worker;
    /// 5. spawns the internal ticker, unless `tick_interval` is zero.
    pub async fn start(self: &Arc<Self>) -> Result<(), RuntimeError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyStarted);
        }

        let entries: Vec<Arc<TaskEntry>> =
            self.tasks.lock().unwrap().values().cloned().collect();

        for entry in &entries {
            entry
                .load_last_run(self.store.as_ref(), self.ctx.hostname())
                .await;
        }

        self.spawn_sync_listener();

        for entry in &entries {
            if entry.check_immediate() {
                info!(tag = entry.tag(), "running startup-immediate task");
                run_once(entry, self.store.as_ref(), &self.ctx, &self.runtime).await;
            } else if entry.check_startup() {
                info!(tag = entry.tag(), "queueing startup task");
                self.ctx
                    .publish(Event::now(EventKind::TaskQueued).with_task(entry.tag()));
                self.queue.push(Arc::clone(entry));
            }
        }

        info!(host = self.ctx.hostname(), "starting keeper");

        if !self.queue.is_empty() {
            self.ensure_worker();
        }
        if self.cfg.tick_interval > Duration::ZERO {
            self.spawn_ticker();
        }
        Ok(())
    }

    /// One eligibility pass. Called by the internal ticker, or directly by
    /// an external timer when `tick_interval` is zero.
    ///
    /// Never blocks on worker completion: it checks, enqueues, signals,
    /// and reaps terminated stragglers.
    pub fn tick(&self, now: DateTime<Utc>) {
        if self.runtime.is_cancelled() {
            // shutdown in progress; do not queue new work or spawn workers
            return;
        }
        debug!(%now, "evaluating maintenance tasks");

        let entries: Vec<Arc<TaskEntry>> =
            self.tasks.lock().unwrap().values().cloned().collect();
        {
            let mut rng = self.rng.lock().unwrap();
            for entry in entries {
                if entry.check_run(now, &mut *rng) {
                    info!(tag = entry.tag(), "queueing maintenance task");
                    self.ctx
                        .publish(Event::now(EventKind::TaskQueued).with_task(entry.tag()));
                    self.queue.push(entry);
                }
            }
        }

        if !self.queue.is_empty() {
            self.ensure_worker();
        }
        self.reap_workers();
    }

    /// Shuts the keeper down:
    ///
    /// 1. releases queued-but-unstarted items without running them;
    /// 2. cancels the runtime token — advisory termination for in-flight
    ///    bodies (a body may ignore it and run to completion), and the stop
    ///    signal for the ticker and sync listener;
    /// 3. discards and wakes every worker, then waits up to
    ///    [`Config::grace`] for them to terminate.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] naming the tasks still
    /// executing when the grace expired; their workers are abandoned.
    ///
    /// Deployments driving `tick` from an external timer should stop that
    /// timer before shutting down; ticks arriving afterwards are ignored.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        info!("shutting down keeper");
        self.ctx.publish(Event::now(EventKind::ShutdownRequested));

        let dropped = self.queue.clear();
        if dropped > 0 {
            debug!(dropped, "released queued tasks without running");
        }

        self.runtime.cancel();

        let workers: Vec<WorkerHandle> = self.workers.lock().unwrap().drain(..).collect();
        for worker in &workers {
            worker.discard();
            worker.wake();
        }

        let grace = self.cfg.grace;
        let deadline = Instant::now() + grace;
        let mut stuck = Vec::new();
        for worker in workers {
            let tag = worker.current_tag();
            if timeout_at(deadline, worker.join()).await.is_err() {
                stuck.push(tag.unwrap_or_else(|| "<unknown>".to_string()));
            }
        }

        if stuck.is_empty() {
            Ok(())
        } else {
            warn!(?stuck, "shutdown grace exceeded");
            self.ctx.publish(Event::now(EventKind::GraceExceeded));
            Err(RuntimeError::GraceExceeded { grace, stuck })
        }
    }

    /// Guarantees exactly one fresh drainer is working the queue.
    fn ensure_worker(&self) {
        let mut workers = self.workers.lock().unwrap();
        if workers.is_empty() {
            debug!("starting initial worker");
            workers.push(self.spawn_worker());
            self.ctx.publish(Event::now(EventKind::WorkerSpawned));
        } else if !workers[0].is_idle() {
            // the primary is still off processing something; discard it and
            // put a fresh drainer in front so the new work is not delayed
            debug!(active = workers.len(), "primary worker busy; spawning replacement");
            workers[0].discard();
            self.ctx.publish(Event::now(EventKind::WorkerDiscarded));
            workers.insert(0, self.spawn_worker());
            self.ctx.publish(Event::now(EventKind::WorkerSpawned));
        } else {
            debug!("waking idle worker");
            workers[0].wake();
        }
    }

    fn spawn_worker(&self) -> WorkerHandle {
        WorkerHandle::spawn(
            Arc::clone(&self.queue),
            Arc::clone(&self.store),
            self.ctx.clone(),
            self.runtime.clone(),
        )
    }

    /// Removes terminated workers beyond the primary.
    fn reap_workers(&self) {
        let mut workers = self.workers.lock().unwrap();
        if workers.len() <= 1 {
            return;
        }
        let before = workers.len();
        let mut i = 1;
        while i < workers.len() {
            if workers[i].is_finished() {
                workers.remove(i);
            } else {
                i += 1;
            }
        }
        if workers.len() < before {
            debug!(before, after = workers.len(), "reaped discarded workers");
        }
    }

    /// Applies incoming synchronization messages to registered tasks.
    fn spawn_sync_listener(self: &Arc<Self>) {
        let mut rx = self.ctx.subscribe();
        let keeper = Arc::clone(self);
        let runtime = self.runtime.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = runtime.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) if ev.is_sync() => keeper.apply_sync(&ev),
                        Ok(_) => {}
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "sync listener lagged behind the bus");
                        }
                    }
                }
            }
        });
    }

    fn apply_sync(&self, ev: &Event) {
        let (Some(tag), Some(last_run)) = (&ev.task, ev.last_run) else {
            return;
        };
        let entry = self.tasks.lock().unwrap().get(tag.as_ref()).cloned();
        if let Some(entry) = entry {
            if entry.scope() == Scope::Instance {
                return;
            }
            debug!(tag = %tag, %last_run, "applying synchronized last-run");
            entry.set_last_run(last_run);
        }
    }

    /// Drives `tick` at the configured interval until shutdown.
    fn spawn_ticker(self: &Arc<Self>) {
        let keeper = Arc::clone(self);
        let runtime = self.runtime.clone();
        let period = self.cfg.tick_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the first interval tick completes immediately; startup
            // handling already covered that pass
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = runtime.cancelled() => break,
                    _ = ticker.tick() => keeper.tick(Utc::now()),
                }
            }
        });
    }

    #[cfg(test)]
    pub(crate) fn worker_count(&self) -> usize {
        self.workers.lock().unwrap().len()
    }
}
