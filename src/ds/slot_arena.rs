//! Slot arena: a vector of optional slots plus a free list.
//!
//! Backs the eviction list so that list nodes refer to each other by
//! [`SlotId`] instead of pointers. Freed slots are recycled LIFO, which keeps
//! the backing vector no larger than the peak number of live entries (for a
//! bounded cache, its capacity plus one transient insert).
//!
//! ```text
//!   slots:     [ Some(a) | None | Some(c) | None ]
//!   free_list: [ 3, 1 ]          next insert reuses slot 1
//! ```

/// Stable handle to a slot in a [`SlotArena`].
///
/// Handles stay valid until the slot is removed; after that they may be
/// reused for an unrelated value, so owners must drop a handle together with
/// the value it named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    #[cfg(test)]
    fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Creates an arena that can hold `capacity` values before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores `value`, reusing a freed slot when one is available.
    pub fn insert(&mut self, value: T) -> SlotId {
        let idx = match self.free_list.pop() {
            Some(idx) => {
                self.slots[idx] = Some(value);
                idx
            },
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            },
        };
        self.len += 1;
        SlotId(idx)
    }

    /// Frees the slot and returns its value; `None` if it was already free.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let value = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: SlotId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots ever allocated, live or free.
    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }

    #[cfg(test)]
    fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|value| (SlotId(idx), value)))
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let occupied = self.slots.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(occupied, self.len);
        assert_eq!(occupied + self.free_list.len(), self.slots.len());
        for &idx in &self.free_list {
            assert!(self.slots[idx].is_none(), "free list names live slot {idx}");
        }
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
