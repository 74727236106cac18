use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table of per-key async mutexes
///
/// Entries exist only while a task holds or waits on the key.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    table: Mutex<HashMap<String, Slot>>,
}

#[derive(Debug, Default)]
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Holders plus waiters
    users: usize,
}

impl KeyedLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    ///
    /// Cancel safe: dropping the future while it waits gives up its place
    /// in the table.
    pub(crate) async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let mutex = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = table.entry(key.to_string()).or_default();
            slot.users += 1;
            Arc::clone(&slot.mutex)
        };

        // Registered before the first await so cancellation still releases
        let mut held = KeyGuard {
            locks: self,
            key: key.to_string(),
            guard: None,
        };
        held.guard = Some(mutex.lock_owned().await);
        held
    }

    /// Number of keys currently held or awaited
    #[cfg(test)]
    pub(crate) fn active_keys(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, key: &str) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = table.get_mut(key) {
            slot.users -= 1;
            if slot.users == 0 {
                table.remove(key);
            }
        }
    }
}

/// Exclusive access to one key, released on drop
#[derive(Debug)]
pub(crate) struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let guard = locks.lock("a").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.lock("a").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished(), "second holder must wait");

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("a").await;

        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("b")).await;
        assert!(b.is_ok(), "unrelated key must not wait");
    }

    #[tokio::test]
    async fn test_entries_pruned_after_release() {
        let locks = KeyedLocks::new();
        {
            let _a = locks.lock("a").await;
            let _b = locks.lock("b").await;
            assert_eq!(locks.active_keys(), 2);
        }
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_after_handoff_is_pruned() {
        let locks = KeyedLocks::new();
        let holder = locks.lock("a").await;

        let mut waiter = Box::pin(locks.lock("a"));
        assert!(futures::poll!(waiter.as_mut()).is_pending());
        assert_eq!(locks.active_keys(), 1);

        // Lock is handed to the waiter, which is then dropped unpolled
        drop(holder);
        assert_eq!(locks.active_keys(), 1);
        drop(waiter);

        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_timed_out_waiter_is_pruned() {
        let locks = KeyedLocks::new();
        let holder = locks.lock("a").await;

        let waited = tokio::time::timeout(Duration::from_millis(20), locks.lock("a")).await;
        assert!(waited.is_err());
        assert_eq!(locks.active_keys(), 1);

        drop(holder);
        assert_eq!(locks.active_keys(), 0);

        // The key is usable again
        let _again = locks.lock("a").await;
        assert_eq!(locks.active_keys(), 1);
    }
}
