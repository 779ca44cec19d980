//! Per-key write serialization.
//!
//! Read-modify-write operations replace a whole document, so two writers on
//! the same key could lose one party's update. Serializing them behind a
//! per-key async mutex closes that race in-process while leaving operations
//! on different keys fully parallel. There is deliberately no global lock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A map of async mutexes, one per document key.
///
/// Lock entries are retained for the lifetime of the store; keys are
/// user/item ids, which are bounded by the catalog and user base.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting behind any same-key writer.
    pub(crate) async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .inner
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_key_waits_for_the_holder() {
        let locks = KeyedLocks::new();
        let guard = locks.acquire("u1").await;

        let blocked = tokio::time::timeout(Duration::from_millis(20), locks.acquire("u1")).await;
        assert!(blocked.is_err(), "same key must wait");

        drop(guard);
        let reacquired =
            tokio::time::timeout(Duration::from_millis(20), locks.acquire("u1")).await;
        assert!(reacquired.is_ok(), "released key must be acquirable");
    }

    #[tokio::test]
    async fn different_keys_do_not_contend() {
        let locks = KeyedLocks::new();
        let _guard = locks.acquire("u1").await;

        let other = tokio::time::timeout(Duration::from_millis(20), locks.acquire("u2")).await;
        assert!(other.is_ok(), "different keys must stay parallel");
    }
}
