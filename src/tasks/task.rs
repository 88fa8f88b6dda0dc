//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable) implemented by
//! every maintenance task body. The common handle type is [`TaskRef`], an
//! `Arc<dyn Task>` suitable for sharing between the registry, the run
//! queue, and whichever worker executes it.
//!
//! A task receives a [`CancellationToken`] when executed. Cancellation is
//! advisory: it fires at keeper shutdown, and a body may check it to exit
//! early or ignore it and run to completion.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a task body.
pub type TaskRef = Arc<dyn Task>;

/// # A maintenance task body.
///
/// A `Task` has a stable [`tag`](Task::tag) — the unique identity under
/// which it is registered, keyed in the last-run store, and named in
/// synchronization messages — and an async [`run`](Task::run) method.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use upkeep::{Task, TaskError};
///
/// struct LogCleanup;
///
/// #[async_trait]
/// impl Task for LogCleanup {
///     fn tag(&self) -> &str { "log-cleanup" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // prune old logs...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns the task's unique tag.
    fn tag(&self) -> &str;

    /// Executes the task body.
    ///
    /// `ctx` is cancelled when the keeper shuts down; honoring it is
    /// optional but lets shutdown finish inside its grace period.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}
