//! Fixed-size write ring.
//!
//! A preallocated slot array with a single write index. New keys are written
//! at the write index, which then advances modulo capacity, so the slot that
//! gets overwritten is always the oldest *physical* write. Reads never move
//! anything: eviction order is slot-rotation order regardless of access
//! pattern.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────┐
//!   │                     FixedRing<K, V>                       │
//!   │                                                           │
//!   │   slots: Vec<Option<Slot<K, V>>>   (len == capacity)      │
//!   │                                                           │
//!   │     [0] A     [1] B     [2] C     [3] (empty)             │
//!   │                                    ▲                      │
//!   │                                    └── next_write         │
//!   │                                                           │
//!   │   insert(D): slot 3 ← D, next_write = 0                   │
//!   │   insert(E): slot 0 ← E (A overwritten), next_write = 1   │
//!   │   insert(B'): B present → overwritten in place at slot 1  │
//!   └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Performance Characteristics
//!
//! | Operation  | Time | Notes                                  |
//! |------------|------|----------------------------------------|
//! | `get`      | O(n) | Linear scan, no index                  |
//! | `insert`   | O(n) | Scan for an existing key, then O(1)    |
//! | `remove`   | O(n) | Scan, clears the slot                  |
//!
//! Rings are meant to be small (tens of entries); a scan over a compact
//! `Vec` at that size is competitive with hashing and keeps the structure
//! trivially consistent.

use crate::error::InvariantError;

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
}

/// Circular buffer that overwrites its oldest physical slot on overflow.
#[derive(Debug)]
pub struct FixedRing<K, V> {
    slots: Vec<Option<Slot<K, V>>>,
    next_write: usize,
    len: usize,
}

impl<K, V> FixedRing<K, V>
where
    K: Eq,
{
    /// Creates a ring with `capacity` preallocated slots.
    ///
    /// A zero-capacity ring accepts no entries.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            next_write: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot index the next new key will be written to.
    pub fn next_write(&self) -> usize {
        self.next_write
    }

    /// Index of the slot holding `key`, if any.
    pub fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.slots.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|slot| slot.key.borrow() == key)
        })
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let idx = self.position(key)?;
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.position(key).is_some()
    }

    /// Writes `key`/`value`.
    ///
    /// An existing key is overwritten in place and does not move. A new key
    /// goes to the write index, displacing whatever lived there; the displaced
    /// entry is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.capacity() == 0 {
            return None;
        }

        if let Some(idx) = self.position(&key) {
            if let Some(slot) = self.slots[idx].as_mut() {
                slot.value = value;
            }
            return None;
        }

        let idx = self.next_write;
        let displaced = self.slots[idx].replace(Slot { key, value });
        self.next_write = (idx + 1) % self.capacity();
        match displaced {
            Some(old) => Some((old.key, old.value)),
            None => {
                self.len += 1;
                None
            },
        }
    }

    /// Clears the slot holding `key`. The write index is left alone, so the
    /// hole is refilled only when rotation reaches it.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let idx = self.position(key)?;
        let slot = self.slots[idx].take()?;
        self.len -= 1;
        Some(slot.value)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.next_write = 0;
        self.len = 0;
    }

    /// Iterates occupied slots in physical order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|slot| (&slot.key, &slot.value)))
    }

    /// Checks slot occupancy against `len`, write index bounds and key
    /// uniqueness.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let occupied = self.slots.iter().filter(|slot| slot.is_some()).count();
        if occupied != self.len {
            return Err(InvariantError::new(format!(
                "ring holds {} entries but len is {}",
                occupied, self.len
            )));
        }
        let write_ok = if self.capacity() == 0 {
            self.next_write == 0
        } else {
            self.next_write < self.capacity()
        };
        if !write_ok {
            return Err(InvariantError::new(format!(
                "write index {} out of bounds for capacity {}",
                self.next_write,
                self.capacity()
            )));
        }
        let keys: Vec<&K> = self.iter().map(|(key, _)| key).collect();
        for (i, key) in keys.iter().enumerate() {
            if keys[i + 1..].iter().any(|other| other == key) {
                return Err(InvariantError::new("duplicate key in ring"));
            }
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    /// Returns slot occupancy in physical order.
    pub fn debug_snapshot_slots(&self) -> Vec<Option<&K>> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().map(|slot| &slot.key))
            .collect()
    }
}
