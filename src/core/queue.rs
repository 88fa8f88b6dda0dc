//! # Run queue: tasks confirmed eligible, pending execution.
//!
//! [`RunQueue`] is a strict FIFO of shared [`TaskEntry`] references. The
//! tick path appends, workers pop. Entries are referenced, not copied, so a
//! worker's run-state mutations are immediately visible to the registry.
//!
//! ## Rules
//! - Enqueue order across tasks within one tick is registry iteration
//!   order (sorted by tag); there is no priority.
//! - The same tag is never present twice: the entry's `confirmed` flag
//!   gates enqueue.
//! - The lock is held only for the push/pop itself, never while a task
//!   body runs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::tasks::TaskEntry;

/// FIFO of confirmed-eligible tasks, shared between the tick path and the
/// workers.
#[derive(Default)]
pub(crate) struct RunQueue {
    items: Mutex<VecDeque<Arc<TaskEntry>>>,
}

impl RunQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends an entry at the tail.
    pub(crate) fn push(&self, entry: Arc<TaskEntry>) {
        self.items.lock().unwrap().push_back(entry);
    }

    /// Removes and returns the head entry, if any.
    pub(crate) fn pop(&self) -> Option<Arc<TaskEntry>> {
        self.items.lock().unwrap().pop_front()
    }

    /// Drops every queued entry without running it; returns how many were
    /// released.
    pub(crate) fn clear(&self) -> usize {
        let mut items = self.items.lock().unwrap();
        let dropped = items.len();
        items.clear();
        dropped
    }

    /// Returns true if nothing is queued.
    pub(crate) fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    use crate::error::TaskError;
    use crate::policies::Schedule;
    use crate::tasks::{TaskFn, TaskSpec};

    fn entry(tag: &'static str) -> Arc<TaskEntry> {
        let task = TaskFn::arc(tag, |_ctx: CancellationToken| async move {
            Ok::<(), TaskError>(())
        });
        Arc::new(TaskEntry::new(TaskSpec::new(task, Schedule::Always)))
    }

    #[test]
    fn test_fifo_order() {
        let q = RunQueue::new();
        q.push(entry("first"));
        q.push(entry("second"));

        assert_eq!(q.pop().unwrap().tag(), "first");
        assert_eq!(q.pop().unwrap().tag(), "second");
        assert!(q.pop().is_none());
    }

    #[test]
    fn test_clear_reports_dropped() {
        let q = RunQueue::new();
        q.push(entry("a"));
        q.push(entry("b"));

        assert_eq!(q.clear(), 2);
        assert!(q.is_empty());
    }
}
