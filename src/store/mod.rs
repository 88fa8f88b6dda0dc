//! # Persistent last-run storage.
//!
//! The keeper treats the storage backend as an external collaborator behind
//! the [`LastRunStore`] trait: the deployment brings its database, the
//! keeper brings the keying rules.
//!
//! ## Keying rules
//! - [`Scope::Global`](crate::Scope::Global) rows are keyed by tag alone
//!   (host-independent).
//! - [`Scope::Host`](crate::Scope::Host) rows are keyed by `(tag, host)`.
//! - [`Scope::Instance`](crate::Scope::Instance) history is never persisted;
//!   the keeper does not call the store for instance-scoped tasks, and
//!   implementations should treat such calls as no-ops.
//!
//! [`MemoryStore`] is the bundled in-process implementation, suitable for
//! tests and single-process deployments that do not need durability.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::tasks::Scope;

/// Backend holding last-run timestamps across restarts and instances.
///
/// Implementations must be cheap enough to call once per completed task
/// run; failures are logged by the keeper and never abort scheduling.
#[async_trait]
pub trait LastRunStore: Send + Sync + 'static {
    /// Loads the persisted last-run time for `(tag, scope, host)`.
    ///
    /// Returns `Ok(None)` when the task has no recorded run.
    async fn load(
        &self,
        tag: &str,
        scope: Scope,
        host: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Persists the last-run time for `(tag, scope, host)`.
    async fn save(
        &self,
        tag: &str,
        scope: Scope,
        host: &str,
        last_run: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
