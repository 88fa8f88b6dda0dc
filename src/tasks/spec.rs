//! # Task specification for registration.
//!
//! Defines [`TaskSpec`] — the configuration bundle describing how a task is
//! scheduled and shared: its body, run-history [`Scope`], [`StartupPolicy`],
//! and eligibility [`Schedule`].
//!
//! A spec is created with [`TaskSpec::new`] and refined with the `with_*`
//! builders, then handed to [`Keeper::register`](crate::Keeper::register).

use crate::policies::Schedule;
use crate::tasks::task::TaskRef;

/// Where a task's run history lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// History is local to this process; never persisted or shared.
    Instance,
    /// History is persisted per `(tag, host)` and shared between instances
    /// on the same host.
    Host,
    /// History is persisted host-independently and shared across all
    /// cooperating instances.
    Global,
}

/// What happens to a task when the keeper starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartupPolicy {
    /// No special treatment; the task waits for its window.
    None,
    /// The task is queued at startup and runs once a worker picks it up.
    OnStartup,
    /// The task runs synchronously inside `start()`, before it returns.
    Immediate,
}

/// Specification for a registered maintenance task.
///
/// Bundles together:
/// - the task body ([`TaskRef`])
/// - the run-history [`Scope`]
/// - the [`StartupPolicy`]
/// - the eligibility [`Schedule`]
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use upkeep::{Periodic, Schedule, Scope, StartupPolicy, TaskFn, TaskSpec, TaskError};
///
/// let body = TaskFn::arc("db-vacuum", |_ctx: CancellationToken| async move {
///     Ok::<_, TaskError>(())
/// });
///
/// let spec = TaskSpec::new(
///     body,
///     Schedule::Periodic(Periodic::new(Duration::from_secs(3600))),
/// )
/// .with_scope(Scope::Global)
/// .with_startup(StartupPolicy::OnStartup);
///
/// assert_eq!(spec.tag(), "db-vacuum");
/// ```
#[derive(Clone)]
pub struct TaskSpec {
    task: TaskRef,
    scope: Scope,
    startup: StartupPolicy,
    schedule: Schedule,
}

impl TaskSpec {
    /// Creates a specification with the given body and schedule.
    ///
    /// Defaults: `Scope::Instance`, `StartupPolicy::None`.
    pub fn new(task: TaskRef, schedule: Schedule) -> Self {
        Self {
            task,
            scope: Scope::Instance,
            startup: StartupPolicy::None,
            schedule,
        }
    }

    /// Returns a reference to the task body.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Convenience: returns the task tag.
    pub fn tag(&self) -> &str {
        self.task.tag()
    }

    /// Returns the run-history scope.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the startup policy.
    pub fn startup(&self) -> StartupPolicy {
        self.startup
    }

    /// Returns the eligibility schedule.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Returns a new spec with the given scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Returns a new spec with the given startup policy.
    pub fn with_startup(mut self, startup: StartupPolicy) -> Self {
        self.startup = startup;
        self
    }
}
