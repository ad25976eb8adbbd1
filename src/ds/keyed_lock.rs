//! Per-key async exclusivity.
//!
//! A [`KeyedLock`] hands out at most one [`KeyGuard`] per key at a time.
//! Callers for the same key queue in FIFO order on a `tokio` mutex; callers
//! for different keys never touch each other's mutex. The registry only holds
//! keys that currently have a holder or a waiter.
//!
//! ```text
//!   registry: Mutex<FxHashMap<String, Entry { mutex, refs }>>
//!
//!   acquire("a") ──► refs += 1 (insert if absent) ──► lock_owned().await
//!   drop(guard)  ──► unlock ──► refs -= 1 ──► remove "a" when refs == 0
//! ```
//!
//! Cancellation is drop: a pending `acquire` future that is dropped gives up
//! its place in the queue and its registry reference.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct Entry {
    mutex: Arc<AsyncMutex<()>>,
    // holders plus waiters
    refs: usize,
}

type Registry = Mutex<FxHashMap<String, Entry>>;

/// Registry of per-key mutexes.
#[derive(Default)]
pub struct KeyedLock {
    registry: Arc<Registry>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other guard for `key` is alive, then returns one.
    pub async fn acquire(&self, key: &str) -> KeyGuard {
        let slot = self.register(key);
        let permit = Arc::clone(&slot.mutex).lock_owned().await;
        KeyGuard {
            _permit: permit,
            _slot: slot,
        }
    }

    /// Number of keys with a holder or a waiter.
    pub fn active_keys(&self) -> usize {
        self.registry.lock().len()
    }

    fn register(&self, key: &str) -> SlotRef {
        let mut registry = self.registry.lock();
        let entry = registry.entry(key.to_owned()).or_insert_with(|| Entry {
            mutex: Arc::new(AsyncMutex::new(())),
            refs: 0,
        });
        entry.refs += 1;
        SlotRef {
            key: key.to_owned(),
            mutex: Arc::clone(&entry.mutex),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl fmt::Debug for KeyedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLock")
            .field("active_keys", &self.active_keys())
            .finish()
    }
}

/// Exclusive hold on one key of a [`KeyedLock`]; released on drop.
pub struct KeyGuard {
    // field order matters: the permit must unlock before the slot reference
    // checks whether the registry entry can be dropped
    _permit: OwnedMutexGuard<()>,
    _slot: SlotRef,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self._slot.key
    }
}

impl fmt::Debug for KeyGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGuard").field("key", &self.key()).finish()
    }
}

/// One counted reference to a registry entry, taken by every holder and
/// every waiter.
struct SlotRef {
    key: String,
    mutex: Arc<AsyncMutex<()>>,
    registry: Arc<Registry>,
}

impl Drop for SlotRef {
    fn drop(&mut self) {
        let mut registry = self.registry.lock();
        let last = match registry.get_mut(&self.key) {
            Some(entry) if Arc::ptr_eq(&entry.mutex, &self.mutex) => {
                entry.refs -= 1;
                entry.refs == 0
            },
            _ => false,
        };
        if last {
            registry.remove(&self.key);
        }
    }
}
