//! Per-key async mutual exclusion.
//!
//! Waiters for the same key queue in arrival order; different keys never
//! contend. Entries are removed once no holder or waiter remains.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slots<K> = Arc<Mutex<HashMap<K, Arc<AsyncMutex<()>>>>>;

pub(crate) struct KeyedLocks<K> {
    slots: Slots<K>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Wait for exclusive access to `key`.
    pub(crate) async fn lock(&self, key: K) -> KeyGuard<K> {
        let slot = self
            .slots
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        let guard = slot.lock_owned().await;
        KeyGuard {
            key,
            slots: Arc::clone(&self.slots),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Held for the duration of a keyed critical section. Owns its references,
/// so it can move into a spawned task.
pub(crate) struct KeyGuard<K: Eq + Hash> {
    key: K,
    slots: Slots<K>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyGuard<K> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        // The map and this guard each hold one reference; anything more is
        // a waiter that will reuse the slot.
        if let Some(slot) = slots.get(&self.key) {
            if Arc::strong_count(slot) <= 2 {
                slots.remove(&self.key);
            }
        }
        self.guard.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            handles.push(tokio::spawn(async move {
                let _g = locks.lock("digest").await;
                assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(1u8).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(2u8)).await;
        assert!(b.is_ok());
    }
}
