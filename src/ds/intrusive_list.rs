//! Recency list backed by `SlotArena`.
//!
//! Nodes live in a [`SlotArena`] and link to each other by [`SlotId`], so
//! promotion and eviction are O(1) splices with no raw pointers and no
//! ownership cycles.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<Node<T>>)
//!   ┌────────┬──────────────────────────────────────────────────┐
//!   │ SlotId │ Node { value, older, younger }                   │
//!   ├────────┼──────────────────────────────────────────────────┤
//!   │ id_1   │ { value: A, younger: None,      older: id_2 }    │
//!   │ id_2   │ { value: B, younger: id_1,      older: id_3 }    │
//!   │ id_3   │ { value: C, younger: id_2,      older: None }    │
//!   └────────┴──────────────────────────────────────────────────┘
//!
//!   front (youngest) ─► [id_1] ◄──► [id_2] ◄──► [id_3] ◄── back (oldest)
//! ```
//!
//! ## Operations
//! - `push_front(value)`: attach as youngest
//! - `move_to_front(id)`: detach + attach as youngest (promotion)
//! - `pop_back()`: detach oldest + free its slot (eviction)
//! - `remove(id)`: detach + free slot
//!
//! All of the above are O(1); `iter` is O(n).
//!
//! [`IntrusiveList::check_links`] walks the list and reports the first broken
//! link as an [`InvariantError`].
use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Node<T> {
    value: T,
    /// Neighbour towards the front (more recently used).
    younger: Option<SlotId>,
    /// Neighbour towards the back (less recently used).
    older: Option<SlotId>,
}

/// Doubly linked list whose nodes are stored in a `SlotArena`.
#[derive(Debug)]
pub struct IntrusiveList<T> {
    arena: SlotArena<Node<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> IntrusiveList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    /// Creates an empty list with reserved node capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.arena.get(id).map(|node| &node.value)
    }

    /// Iterates from youngest to oldest.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    /// Iterates `(SlotId, &T)` pairs from youngest to oldest.
    pub fn iter_entries(&self) -> EntryIter<'_, T> {
        EntryIter {
            list: self,
            current: self.head,
        }
    }

    /// Inserts `value` as the youngest node and returns its id.
    pub fn push_front(&mut self, value: T) -> SlotId {
        let id = self.arena.insert(Node {
            value,
            younger: None,
            older: self.head,
        });
        match self.head {
            Some(head) => {
                if let Some(node) = self.arena.get_mut(head) {
                    node.younger = Some(id);
                }
            },
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        id
    }

    /// Removes and returns the oldest value.
    pub fn pop_back(&mut self) -> Option<T> {
        let id = self.tail?;
        self.remove(id)
    }

    /// Unlinks node `id`, frees its slot and returns its value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.detach(id)?;
        self.arena.remove(id).map(|node| node.value)
    }

    /// Promotes `id` to youngest; returns `false` if `id` is not in the list.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }
        if self.head == Some(id) {
            return true;
        }
        self.detach(id);
        self.attach_front(id);
        true
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    fn detach(&mut self, id: SlotId) -> Option<()> {
        let (younger, older) = {
            let node = self.arena.get(id)?;
            (node.younger, node.older)
        };

        match younger {
            Some(younger_id) => {
                if let Some(node) = self.arena.get_mut(younger_id) {
                    node.older = older;
                }
            },
            None => self.head = older,
        }

        match older {
            Some(older_id) => {
                if let Some(node) = self.arena.get_mut(older_id) {
                    node.younger = younger;
                }
            },
            None => self.tail = younger,
        }

        if let Some(node) = self.arena.get_mut(id) {
            node.younger = None;
            node.older = None;
        }
        Some(())
    }

    fn attach_front(&mut self, id: SlotId) -> Option<()> {
        let old_head = self.head;
        let node = self.arena.get_mut(id)?;
        node.younger = None;
        node.older = old_head;
        match old_head {
            Some(old_head) => {
                if let Some(head_node) = self.arena.get_mut(old_head) {
                    head_node.younger = Some(id);
                }
            },
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        Some(())
    }

    /// Walks the list from youngest to oldest and checks every link.
    ///
    /// Verifies that back-links mirror forward links, that the walk ends at
    /// the tail after exactly `len()` steps, and that no node is visited twice.
    pub fn check_links(&self) -> Result<(), InvariantError> {
        if self.head.is_none() || self.tail.is_none() {
            if self.head.is_some() || self.tail.is_some() || !self.is_empty() {
                return Err(InvariantError::new(format!(
                    "list ends disagree: head={:?} tail={:?} len={}",
                    self.head,
                    self.tail,
                    self.len()
                )));
            }
            return Ok(());
        }

        let mut steps = 0usize;
        let mut current = self.head;
        let mut younger = None;
        let mut last = None;
        while let Some(id) = current {
            steps += 1;
            if steps > self.len() {
                return Err(InvariantError::new(format!(
                    "walk exceeded len {} (cycle through {:?})",
                    self.len(),
                    id
                )));
            }
            let node = self
                .arena
                .get(id)
                .ok_or_else(|| InvariantError::new(format!("dangling link to {:?}", id)))?;
            if node.younger != younger {
                return Err(InvariantError::new(format!(
                    "node {:?} back-link {:?} != {:?}",
                    id, node.younger, younger
                )));
            }
            younger = Some(id);
            last = Some(id);
            current = node.older;
        }

        if last != self.tail {
            return Err(InvariantError::new(format!(
                "walk ended at {:?} but tail is {:?}",
                last, self.tail
            )));
        }
        if steps != self.len() {
            return Err(InvariantError::new(format!(
                "walked {} nodes but len is {}",
                steps,
                self.len()
            )));
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_links() {
            panic!("intrusive list invariant violated: {err}");
        }
        self.arena.debug_validate_invariants();
    }
}

impl<T> Default for IntrusiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over values from youngest to oldest.
pub struct Iter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.older;
        Some(&node.value)
    }
}

/// Iterator over `(SlotId, &T)` pairs from youngest to oldest.
pub struct EntryIter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for EntryIter<'a, T> {
    type Item = (SlotId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.older;
        Some((id, &node.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order<T: Copy>(list: &IntrusiveList<T>) -> Vec<T> {
        list.iter().copied().collect()
    }

    #[test]
    fn push_front_orders_youngest_first() {
        let mut list = IntrusiveList::new();
        list.push_front("wooper");
        list.push_front("dragalge");
        list.push_front("miltank");
        assert_eq!(order(&list), vec!["miltank", "dragalge", "wooper"]);
        list.debug_validate_invariants();
    }

    #[test]
    fn move_to_front_promotes_middle_and_tail() {
        let mut list = IntrusiveList::new();
        let a = list.push_front("a");
        let b = list.push_front("b");
        let _c = list.push_front("c");

        assert!(list.move_to_front(b));
        assert_eq!(order(&list), vec!["b", "c", "a"]);

        assert!(list.move_to_front(a));
        assert_eq!(order(&list), vec!["a", "b", "c"]);

        assert!(list.move_to_front(a));
        assert_eq!(order(&list), vec!["a", "b", "c"]);
        list.debug_validate_invariants();
    }

    #[test]
    fn pop_back_evicts_oldest() {
        let mut list = IntrusiveList::new();
        list.push_front(1);
        list.push_front(2);
        list.push_front(3);
        assert_eq!(list.pop_back(), Some(1));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
        list.debug_validate_invariants();
    }

    #[test]
    fn remove_middle_and_ends() {
        let mut list = IntrusiveList::new();
        let a = list.push_front("a");
        let b = list.push_front("b");
        let c = list.push_front("c");

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(order(&list), vec!["c", "a"]);
        assert_eq!(list.remove(c), Some("c"));
        assert_eq!(order(&list), vec!["a"]);
        assert_eq!(list.remove(a), Some("a"));
        assert!(list.is_empty());
        assert_eq!(list.iter().next(), None);
        assert_eq!(list.remove(a), None);
        assert!(!list.move_to_front(a));
        list.debug_validate_invariants();
    }

    #[test]
    fn entry_iter_pairs_ids_with_values() {
        let mut list = IntrusiveList::new();
        let a = list.push_front(10);
        let b = list.push_front(20);
        let entries: Vec<_> = list.iter_entries().map(|(id, v)| (id, *v)).collect();
        assert_eq!(entries, vec![(b, 20), (a, 10)]);
        assert_eq!(list.get(a), Some(&10));
    }

    #[test]
    fn clear_resets_state() {
        let mut list = IntrusiveList::with_capacity(4);
        list.push_front(1);
        list.push_front(2);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.iter().next(), None);
        assert_eq!(list.pop_back(), None);
        assert!(list.check_links().is_ok());
    }

    #[test]
    fn check_links_survives_churn() {
        let mut list = IntrusiveList::new();
        let mut ids = Vec::new();
        for i in 0..32 {
            ids.push(list.push_front(i));
            if i % 3 == 0 {
                list.move_to_front(ids[i / 2]);
            }
            if i % 5 == 0 {
                list.pop_back();
            }
        }
        assert!(list.check_links().is_ok());
        list.debug_validate_invariants();
    }
}
