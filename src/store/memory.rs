//! In-process last-run store backed by a `HashMap`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::LastRunStore;
use crate::error::StoreError;
use crate::tasks::Scope;

/// Row key: global rows carry no host.
type Key = (String, Option<String>);

/// In-process [`LastRunStore`] with no durability.
///
/// Instances sharing one `MemoryStore` (behind an `Arc`) see each other's
/// writes, which is enough to exercise host/global scoping in tests and in
/// single-process multi-instance setups.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<Key, DateTime<Utc>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(tag: &str, scope: Scope, host: &str) -> Option<Key> {
        match scope {
            Scope::Instance => None,
            Scope::Host => Some((tag.to_string(), Some(host.to_string()))),
            Scope::Global => Some((tag.to_string(), None)),
        }
    }
}

#[async_trait]
impl LastRunStore for MemoryStore {
    async fn load(
        &self,
        tag: &str,
        scope: Scope,
        host: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let Some(key) = Self::key(tag, scope, host) else {
            return Ok(None);
        };
        Ok(self.rows.lock().unwrap().get(&key).copied())
    }

    async fn save(
        &self,
        tag: &str,
        scope: Scope,
        host: &str,
        last_run: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let Some(key) = Self::key(tag, scope, host) else {
            return Ok(());
        };
        self.rows.lock().unwrap().insert(key, last_run);
        Ok(())
    }
}
