//! # Registry entry: one task's immutable spec plus its mutable run-state.
//!
//! [`TaskEntry`] is the record the keeper holds per registered task. It is
//! shared (`Arc`) between the registry, the run queue, and whichever worker
//! executes it, so run-state mutations made by a worker are immediately
//! visible to the tick path.
//!
//! ## Eligibility state machine
//! ```text
//! Idle ──check_run()──► Queued ──confirm_run()/run──► Running ──update_last_run()──► Idle
//!            │                        │
//!            │ (confirmed set)        │ (false if a sync message advanced
//!            └── duplicate checks ◄───┘  last_run since enqueue: item dropped)
//! ```
//!
//! `confirmed` marks the Queued state: it is set when the eligibility check
//! passes, blocks duplicate enqueues while the entry sits in the queue, and
//! is cleared when the run-state advances (run completion or an external
//! synchronization message).

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, warn};

use crate::context::HostContext;
use crate::events::Event;
use crate::policies::Window;
use crate::store::LastRunStore;
use crate::tasks::spec::{Scope, StartupPolicy, TaskSpec};
use crate::tasks::task::TaskRef;

/// Mutable run-state, advanced by run completion or synchronization.
struct RunState {
    last_run: DateTime<Utc>,
    confirmed: bool,
    window: Window,
    current_prob: f64,
}

/// One registered task: immutable spec plus mutable run-state.
pub struct TaskEntry {
    spec: TaskSpec,
    state: Mutex<RunState>,
}

impl TaskEntry {
    /// Creates a fresh entry. `last_run` starts at the epoch ("never run").
    pub fn new(spec: TaskSpec) -> Self {
        let never = DateTime::UNIX_EPOCH;
        let window = spec.schedule().compute_window(never);
        Self {
            spec,
            state: Mutex::new(RunState {
                last_run: never,
                confirmed: false,
                window,
                current_prob: 1.0,
            }),
        }
    }

    /// Returns the task's tag.
    pub fn tag(&self) -> &str {
        self.spec.tag()
    }

    /// Returns the run-history scope.
    pub fn scope(&self) -> Scope {
        self.spec.scope()
    }

    /// Returns a handle to the task body.
    pub fn task(&self) -> &TaskRef {
        self.spec.task()
    }

    /// Returns the last completed run time (epoch = never run).
    pub fn last_run(&self) -> DateTime<Utc> {
        self.state.lock().unwrap().last_run
    }

    /// Returns true while the entry is queued but not yet executed.
    pub fn is_confirmed(&self) -> bool {
        self.state.lock().unwrap().confirmed
    }

    /// Evaluates eligibility for this tick.
    ///
    /// Returns false immediately if the entry is already queued (the
    /// `confirmed` flag prevents a second live queue entry for the same
    /// tag). Otherwise runs the schedule's predicate and, on success,
    /// marks the entry confirmed.
    pub fn check_run(&self, now: DateTime<Utc>, rng: &mut impl Rng) -> bool {
        let mut st = self.state.lock().unwrap();
        if st.confirmed {
            // already in the queue; do not queue a second time
            return false;
        }
        let RunState {
            last_run,
            confirmed,
            window,
            current_prob,
        } = &mut *st;
        let eligible =
            self.spec
                .schedule()
                .check_eligible(now, *last_run, window, current_prob, rng);
        if eligible {
            *confirmed = true;
        }
        eligible
    }

    /// Marks the entry confirmed if its startup policy queues it at start.
    pub fn check_startup(&self) -> bool {
        if self.spec.startup() == StartupPolicy::OnStartup {
            self.state.lock().unwrap().confirmed = true;
            return true;
        }
        false
    }

    /// Returns true if the startup policy demands a synchronous run.
    pub fn check_immediate(&self) -> bool {
        self.spec.startup() == StartupPolicy::Immediate
    }

    /// Called by a worker just before executing a dequeued entry.
    ///
    /// Returns false if the run was invalidated since enqueue (an external
    /// synchronization message already advanced `last_run` and cleared the
    /// confirmation); the worker then drops the item without executing.
    pub fn confirm_run(&self) -> bool {
        self.state.lock().unwrap().confirmed
    }

    /// Applies a last-run time directly, bypassing the completion path.
    ///
    /// Used when loading persisted history at startup and when a
    /// synchronization message arrives. Clears `confirmed`, recomputes the
    /// window, and resets the probability state.
    pub fn set_last_run(&self, last_run: DateTime<Utc>) {
        let mut st = self.state.lock().unwrap();
        st.last_run = last_run;
        st.confirmed = false;
        st.window = self.spec.schedule().compute_window(last_run);
        st.current_prob = 1.0;
    }

    /// Advances the run-state on (the brink of) execution: write-through to
    /// the store, update in-memory state, broadcast the synchronization
    /// message.
    ///
    /// A failed save is logged and swallowed; in-memory state still
    /// advances so scheduling stays consistent even if durability is lost.
    /// Instance-scoped tasks are neither persisted nor broadcast.
    pub async fn update_last_run(
        &self,
        last_run: DateTime<Utc>,
        store: &dyn LastRunStore,
        ctx: &HostContext,
    ) {
        if self.scope() != Scope::Instance {
            if let Err(e) = store
                .save(self.tag(), self.scope(), ctx.hostname(), last_run)
                .await
            {
                warn!(
                    tag = self.tag(),
                    error = %e,
                    "failed to persist last-run; keeping in-memory state"
                );
            }
        }
        self.set_last_run(last_run);
        if self.scope() != Scope::Instance {
            ctx.publish(Event::last_run_updated(ctx.hostname(), self.tag(), last_run));
        }
    }

    /// Loads persisted history for this entry, if any.
    ///
    /// A load failure is non-fatal: the entry keeps its epoch ("never run")
    /// state and scheduling proceeds.
    pub async fn load_last_run(&self, store: &dyn LastRunStore, host: &str) {
        if self.scope() == Scope::Instance {
            return;
        }
        match store.load(self.tag(), self.scope(), host).await {
            Ok(Some(ts)) => {
                debug!(tag = self.tag(), last_run = %ts, "loaded persisted last-run");
                self.set_last_run(ts);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    tag = self.tag(),
                    error = %e,
                    "failed to load last-run; treating task as never run"
                );
            }
        }
    }

    /// Returns true iff `now` falls inside the eligibility window.
    pub fn in_window(&self, now: DateTime<Utc>) -> bool {
        let st = self.state.lock().unwrap();
        self.spec.schedule().in_window(now, st.last_run, &st.window)
    }

    /// Returns true iff `now` lies past the eligibility window.
    pub fn past_window(&self, now: DateTime<Utc>) -> bool {
        let st = self.state.lock().unwrap();
        self.spec
            .schedule()
            .past_window(now, st.last_run, &st.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::TimeDelta;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tokio_util::sync::CancellationToken;

    use crate::events::{Bus, EventKind};
    use crate::policies::{Periodic, Schedule};
    use crate::store::MemoryStore;
    use crate::tasks::task_fn::TaskFn;

    fn noop(tag: &'static str) -> TaskRef {
        TaskFn::arc(tag, |_ctx: CancellationToken| async move {
            Ok::<(), crate::error::TaskError>(())
        })
    }

    fn hourly_spec(tag: &'static str) -> TaskSpec {
        TaskSpec::new(
            noop(tag),
            Schedule::Periodic(Periodic::new(Duration::from_secs(3600))),
        )
    }

    #[test]
    fn test_confirmed_prevents_duplicate_enqueue() {
        let entry = TaskEntry::new(TaskSpec::new(noop("dup"), Schedule::Always));
        let mut rng = StdRng::seed_from_u64(0);
        let now = Utc::now();

        assert!(entry.check_run(now, &mut rng));
        assert!(!entry.check_run(now, &mut rng), "second check must dedup");

        // completing a run clears the confirmation and re-arms the task
        entry.set_last_run(now);
        assert!(entry.check_run(now, &mut rng));
    }

    #[test]
    fn test_sync_message_invalidates_pending_run() {
        let entry = TaskEntry::new(TaskSpec::new(noop("sync"), Schedule::Always));
        let mut rng = StdRng::seed_from_u64(0);

        assert!(entry.check_run(Utc::now(), &mut rng));
        assert!(entry.confirm_run());

        // another instance ran the task; its sync message lands first
        entry.set_last_run(Utc::now());
        assert!(!entry.confirm_run(), "worker must drop the stale item");
    }

    #[test]
    fn test_periodic_window_end_to_end() {
        let entry = TaskEntry::new(hourly_spec("hourly"));
        let mut rng = StdRng::seed_from_u64(0);
        let now = Utc::now();

        // 1000s elapsed: below the 1800s window start
        entry.set_last_run(now - TimeDelta::seconds(1000));
        assert!(!entry.check_run(now, &mut rng));

        // 6000s elapsed: past the 5400s hard deadline
        entry.set_last_run(now - TimeDelta::seconds(6000));
        assert!(entry.check_run(now, &mut rng));
    }

    #[tokio::test]
    async fn test_update_last_run_persists_and_broadcasts() {
        let store = MemoryStore::new();
        let bus = Bus::new(16);
        let ctx = HostContext::new("host-a", bus.clone());
        let mut rx = bus.subscribe();

        let spec = hourly_spec("global-task").with_scope(Scope::Global);
        let entry = TaskEntry::new(spec);
        let ts = Utc::now();

        entry.set_last_run(ts - TimeDelta::seconds(6000));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(entry.check_run(ts, &mut rng));

        entry.update_last_run(ts, &store, &ctx).await;

        assert_eq!(entry.last_run(), ts);
        assert!(!entry.is_confirmed());
        assert_eq!(
            store.load("global-task", Scope::Global, "host-a").await.unwrap(),
            Some(ts)
        );

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::LastRunUpdated);
        assert_eq!(ev.task.as_deref(), Some("global-task"));
        assert_eq!(ev.host.as_deref(), Some("host-a"));
        assert_eq!(ev.last_run, Some(ts));
    }

    #[tokio::test]
    async fn test_instance_scope_never_persists() {
        let store = MemoryStore::new();
        let bus = Bus::new(16);
        let ctx = HostContext::new("host-a", bus.clone());
        let mut rx = bus.subscribe();

        let entry = TaskEntry::new(hourly_spec("local-task"));
        let ts = Utc::now();
        entry.update_last_run(ts, &store, &ctx).await;

        assert_eq!(entry.last_run(), ts);
        assert!(
            rx.try_recv().is_err(),
            "instance-scoped runs are not broadcast"
        );
        assert_eq!(
            store.load("local-task", Scope::Instance, "host-a").await.unwrap(),
            None
        );
    }
}
