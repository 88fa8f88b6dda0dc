//! Error types used by the upkeep runtime, tasks, and last-run stores.
//!
//! This module defines three error enums:
//!
//! - [`RuntimeError`] — errors raised by the orchestration runtime itself.
//! - [`TaskError`] — errors raised by individual task executions.
//! - [`StoreError`] — errors raised by a [`LastRunStore`](crate::LastRunStore) backend.
//!
//! Runtime and task errors provide `as_label` helpers for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the upkeep runtime.
///
/// These represent failures in the orchestration layer itself, such as a
/// rejected duplicate registration or a shutdown exceeding its grace period.
/// None of them is fatal to the host process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A task with the same tag is already registered; first registration wins.
    #[error("task '{tag}' already registered; rejecting duplicate")]
    DuplicateTag {
        /// The tag that collided.
        tag: String,
    },

    /// `start()` was called more than once on the same keeper.
    #[error("keeper already started")]
    AlreadyStarted,

    /// Shutdown grace period was exceeded; some workers were still executing.
    #[error("shutdown grace {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Tags of the tasks that were still executing when the grace expired.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use upkeep::RuntimeError;
    ///
    /// let err = RuntimeError::AlreadyStarted;
    /// assert_eq!(err.as_label(), "runtime_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::DuplicateTag { .. } => "runtime_duplicate_tag",
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced by task execution.
///
/// A failed task body is the task's own responsibility; the worker loop logs
/// the failure and moves on to the next queued item without retrying.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task observed the advisory cancellation token and exited early.
    #[error("cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Convenience constructor for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }
}

/// # Errors produced by a last-run store backend.
///
/// Store failures are never fatal to scheduling: a failed load defaults the
/// task to "never run", a failed save keeps the in-memory timestamp.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not complete the operation.
    #[error("store backend error: {0}")]
    Backend(String),
}
