//! # upkeep
//!
//! **Upkeep** is an embeddable background maintenance-task scheduler for
//! long-running services.
//!
//! It keeps a registry of recurring or one-shot housekeeping tasks, decides
//! once per tick which are eligible to run, queues the eligible ones, and
//! executes them on a bounded set of drainer workers — guaranteeing that a
//! slow task never blocks timely evaluation of newly eligible tasks.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskSpec   │   │   TaskSpec   │   │   TaskSpec   │
//!     │ (body+policy)│   │ (body+policy)│   │ (body+policy)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ register         ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Keeper                                                           │
//! │  - registry (tag → TaskEntry, iterated in tag order)              │
//! │  - RunQueue (FIFO of confirmed-eligible entries)                  │
//! │  - worker list (index 0 = primary drainer)                        │
//! │  - Bus (events + cross-instance synchronization)                  │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ tick(now): per entry, evaluate the eligibility policy
//!        │
//!        │   Always    ── every tick
//!        │   Periodic  ── probabilistic window over elapsed time:
//!        │                  < min: never   > max: forced
//!        │                  inside: jittered draw, certain by max
//!        │   Daily     ── 24h window clamped into hour-of-day bounds
//!        ▼
//!   RunQueue ──► Worker (drain until empty, then idle)
//!        ▲           │ update_last_run: persist ► store, broadcast ► Bus
//!        │           ▼
//!        │       task body (no locks held; cancellation is advisory)
//!        │
//!   primary busy at tick? ──► discard it (finishes current item, exits),
//!                             spawn fresh primary — at most one straggler
//!                             per replacement, no unbounded thread growth
//! ```
//!
//! ## Scheduling model
//! A periodic task with period `P` and window fractions `[a, b]` never runs
//! before `a·P` has elapsed since its last run, is certain to be queued once
//! `b·P` has passed, and in between fires probabilistically such that the
//! cumulative trigger probability rises linearly across the window. This
//! spreads maintenance load across ticks — and across cooperating
//! instances, which converge on shared last-run times via broadcast
//! [`EventKind::LastRunUpdated`] messages and a pluggable
//! [`LastRunStore`].
//!
//! This is a soft, jittered scheduler, not a cron replacement: eligibility
//! is evaluated once per tick (60s by default), and there is no task
//! prioritization beyond FIFO order.
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                  |
//! |-------------------|----------------------------------------------------------|-------------------------------------|
//! | **Tasks**         | Define bodies as trait impls or closures.                | [`Task`], [`TaskFn`], [`TaskSpec`]  |
//! | **Policies**      | Always / periodic-probabilistic / daily-windowed.        | [`Schedule`], [`Periodic`], [`Daily`] |
//! | **Scopes**        | Instance-local, per-host, or global run history.         | [`Scope`], [`LastRunStore`]         |
//! | **Orchestration** | Tick-driven queueing and bounded drainer workers.        | [`Keeper`]                          |
//! | **Observability** | Bus events and pluggable subscribers.                    | [`Event`], [`Subscribe`]            |
//! | **Errors**        | Typed errors for runtime, tasks, and stores.             | [`RuntimeError`], [`TaskError`]     |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tokio_util::sync::CancellationToken;
//! use upkeep::{
//!     Bus, Config, HostContext, Keeper, MemoryStore, Periodic, Schedule, Scope,
//!     StartupPolicy, TaskError, TaskFn, TaskSpec,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let ctx = HostContext::new("worker-01", Bus::new(cfg.bus_capacity));
//!     let keeper = Keeper::new(cfg, ctx, Arc::new(MemoryStore::new()));
//!
//!     // Prune expired rows roughly once an hour, shared per host.
//!     let prune = TaskFn::arc("db-prune", |_ctx: CancellationToken| async move {
//!         // delete expired rows...
//!         Ok::<_, TaskError>(())
//!     });
//!     keeper.register(
//!         TaskSpec::new(
//!             prune,
//!             Schedule::Periodic(Periodic::new(Duration::from_secs(3600))),
//!         )
//!         .with_scope(Scope::Host)
//!         .with_startup(StartupPolicy::OnStartup),
//!     )?;
//!
//!     keeper.start().await?;
//!     // ... the service does its real work ...
//!     keeper.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod context;
mod core;
mod error;
mod events;
mod policies;
mod store;
pub mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use context::HostContext;
pub use core::Keeper;
pub use error::{RuntimeError, StoreError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use policies::{Daily, Periodic, Schedule, Window};
pub use store::{LastRunStore, MemoryStore};
pub use subscribers::Subscribe;
pub use tasks::{Scope, StartupPolicy, Task, TaskEntry, TaskFn, TaskRef, TaskSpec};

// Optional: expose a simple built-in logging subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
