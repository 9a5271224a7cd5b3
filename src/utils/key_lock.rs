use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async mutual exclusion keyed by id.
///
/// Holders of different keys never wait on each other. An entry lives in the
/// table only while someone holds or waits for it.
#[derive(Default)]
pub struct KeyedLocks {
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

/// Releases the key when dropped.
pub struct KeyGuard<'a> {
    // field order matters: the mutex guard must drop before the slot
    _guard: OwnedMutexGuard<()>,
    _slot: Slot<'a>,
}

/// A caller's claim on a table entry, held from before the wait until release.
/// Dropping the last claim removes the entry, whether the caller got the lock
/// or was cancelled while queued.
struct Slot<'a> {
    owner: &'a KeyedLocks,
    key: u64,
    mutex: Arc<Mutex<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: u64) -> KeyGuard<'_> {
        // Clone out of the shard before awaiting; holding a DashMap ref across
        // an await would block the whole shard.
        let slot = Slot {
            owner: self,
            key,
            mutex: self.locks.entry(key).or_default().clone(),
        };
        let guard = slot.mutex.clone().lock_owned().await;
        KeyGuard {
            _guard: guard,
            _slot: slot,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        // Two references left means only the table and this slot know the mutex.
        // New callers clone under the shard lock, so the count cannot race with `remove_if`.
        self.owner
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 2);
    }
}
