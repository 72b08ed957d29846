//! Recency Ring Module
//!
//! Circular doubly-linked list ordering entries by recency, backed by a slot
//! arena so links are plain indices instead of pointers.
//!
//! ```text
//!          head (MRU)                      tail (LRU)
//!            │                               │
//!   ┌──────► [s2] ◄──► [s0] ◄──► [s5] ◄──► [s1] ◄─────┐
//!   │                                                 │
//!   └───────────── tail.next == head ─────────────────┘
//! ```
//!
//! Freed slots go to a free list and are reused by later inserts.

use crate::error::{CacheError, Result};

/// Stable handle to a node in a [`LruRing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

impl SlotId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: SlotId,
    next: SlotId,
}

// == LRU Ring ==
/// Recency ring where head = most recently used, tail = least recently used.
///
/// Topology is one of: empty (no head, no tail), single (one node linked to
/// itself), or multi (`tail.next == head`, `head.prev == tail`).
#[derive(Debug)]
pub struct LruRing<T> {
    slots: Vec<Option<Node<T>>>,
    free_list: Vec<usize>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl<T> LruRing<T> {
    // == Constructor ==
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty ring with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn head(&self) -> Option<SlotId> {
        self.head
    }

    pub fn tail(&self) -> Option<SlotId> {
        self.tail
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.node(id).is_some()
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.node(id).map(|node| &node.value)
    }

    /// Returns the least recently used value.
    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|id| self.get(id))
    }

    // == Push Front ==
    /// Inserts `value` at the head and returns its handle.
    pub fn push_front(&mut self, value: T) -> SlotId {
        let id = self.alloc(value);
        match (self.head, self.tail) {
            (Some(head), Some(tail)) => {
                self.link(tail, id);
                self.link(id, head);
            }
            _ => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
        id
    }

    // == Move To Front ==
    /// Relinks an existing node at the head. Returns `false` if `id` is not in
    /// the ring.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        let Some((prev, next)) = self.links(id) else {
            return false;
        };
        let (Some(head), Some(tail)) = (self.head, self.tail) else {
            return false;
        };
        if head == id {
            return true;
        }

        if tail == id {
            // The ring is already closed around the tail; rotating is enough.
            self.tail = Some(prev);
        } else {
            self.link(prev, next);
            self.link(tail, id);
            self.link(id, head);
        }
        self.head = Some(id);
        true
    }

    // == Pop Back ==
    /// Removes and returns the least recently used value.
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Remove ==
    /// Unlinks `id` from any position, re-closing the ring.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let (prev, next) = self.links(id)?;
        let head = self.head?;
        let tail = self.tail?;

        if head == id && tail == id {
            self.head = None;
            self.tail = None;
        } else if head == id {
            self.link(tail, next);
            self.head = Some(next);
        } else if tail == id {
            self.link(prev, head);
            self.tail = Some(prev);
        } else {
            self.link(prev, next);
        }

        self.len -= 1;
        self.release(id)
    }

    // == Iter ==
    /// Iterates from head to tail.
    ///
    /// The walk stops when it loops back to the head or after `len` steps,
    /// whichever comes first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            ring: self,
            current: self.head,
            remaining: self.len,
        }
    }

    // == Check Invariants ==
    /// Verifies closure and that the walk from head visits exactly `len` nodes.
    pub fn check_invariants(&self) -> Result<()> {
        let occupied = self.slots.iter().filter(|slot| slot.is_some()).count();
        if occupied != self.len {
            return Err(CacheError::Invariant(format!(
                "ring len {} but {} occupied slots",
                self.len, occupied
            )));
        }

        let (head, tail) = match (self.head, self.tail) {
            (None, None) if self.len == 0 => return Ok(()),
            (Some(head), Some(tail)) if self.len > 0 => (head, tail),
            _ => {
                return Err(CacheError::Invariant(format!(
                    "head/tail {:?}/{:?} inconsistent with len {}",
                    self.head, self.tail, self.len
                )))
            }
        };

        let closed = self.links(head).map(|(prev, _)| prev) == Some(tail)
            && self.links(tail).map(|(_, next)| next) == Some(head);
        if !closed {
            return Err(CacheError::Invariant("ring is not closed".to_string()));
        }

        let mut steps = 0;
        let mut current = head;
        loop {
            let (_, next) = self.links(current).ok_or_else(|| {
                CacheError::Invariant(format!("dangling link to slot {}", current.0))
            })?;
            if self.links(next).map(|(prev, _)| prev) != Some(current) {
                return Err(CacheError::Invariant(format!(
                    "slot {} and slot {} disagree on their link",
                    current.0, next.0
                )));
            }
            steps += 1;
            if next == head {
                break;
            }
            if steps > self.len {
                return Err(CacheError::Invariant(format!(
                    "walk exceeded len {} without returning to head",
                    self.len
                )));
            }
            current = next;
        }

        if steps != self.len {
            return Err(CacheError::Invariant(format!(
                "walk visited {} nodes but len is {}",
                steps, self.len
            )));
        }
        Ok(())
    }

    // == Slot Management ==
    fn alloc(&mut self, value: T) -> SlotId {
        let idx = self.free_list.pop().unwrap_or(self.slots.len());
        let id = SlotId(idx);
        let node = Node {
            value,
            prev: id,
            next: id,
        };
        if idx == self.slots.len() {
            self.slots.push(Some(node));
        } else {
            self.slots[idx] = Some(node);
        }
        id
    }

    fn release(&mut self, id: SlotId) -> Option<T> {
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        Some(node.value)
    }

    fn node(&self, id: SlotId) -> Option<&Node<T>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn links(&self, id: SlotId) -> Option<(SlotId, SlotId)> {
        self.node(id).map(|node| (node.prev, node.next))
    }

    /// Makes `b` follow `a`.
    fn link(&mut self, a: SlotId, b: SlotId) {
        if let Some(node) = self.slots.get_mut(a.0).and_then(Option::as_mut) {
            node.next = b;
        }
        if let Some(node) = self.slots.get_mut(b.0).and_then(Option::as_mut) {
            node.prev = a;
        }
    }
}

impl<T> Default for LruRing<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Head-to-tail iterator over a [`LruRing`].
pub struct Iter<'a, T> {
    ring: &'a LruRing<T>,
    current: Option<SlotId>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (SlotId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.current?;
        let node = self.ring.node(id)?;
        self.remaining -= 1;
        self.current = if Some(node.next) == self.ring.head {
            None
        } else {
            Some(node.next)
        };
        Some((id, &node.value))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn values(ring: &LruRing<&'static str>) -> Vec<&'static str> {
        ring.iter().map(|(_, v)| *v).collect()
    }

    #[test]
    fn test_ring_new() {
        let ring: LruRing<u32> = LruRing::new();
        assert!(ring.is_empty());
        assert_eq!(ring.head(), None);
        assert_eq!(ring.tail(), None);
        ring.check_invariants().unwrap();
    }

    #[test]
    fn test_single_node_is_self_linked() {
        let mut ring = LruRing::new();
        let id = ring.push_front("a");

        assert_eq!(ring.head(), Some(id));
        assert_eq!(ring.tail(), Some(id));
        assert_eq!(ring.links(id), Some((id, id)));
        ring.check_invariants().unwrap();
    }

    #[test]
    fn test_push_front_orders_by_recency() {
        let mut ring = LruRing::new();
        ring.push_front("a");
        ring.push_front("b");
        ring.push_front("c");

        assert_eq!(values(&ring), vec!["c", "b", "a"]);
        assert_eq!(ring.back(), Some(&"a"));
        ring.check_invariants().unwrap();
    }

    #[test]
    fn test_move_to_front_from_tail() {
        let mut ring = LruRing::new();
        let a = ring.push_front("a");
        ring.push_front("b");
        ring.push_front("c");

        assert!(ring.move_to_front(a));

        assert_eq!(values(&ring), vec!["a", "c", "b"]);
        assert_eq!(ring.back(), Some(&"b"));
        ring.check_invariants().unwrap();
    }

    #[test]
    fn test_move_to_front_from_interior() {
        let mut ring = LruRing::new();
        ring.push_front("a");
        let b = ring.push_front("b");
        ring.push_front("c");

        assert!(ring.move_to_front(b));

        assert_eq!(values(&ring), vec!["b", "c", "a"]);
        ring.check_invariants().unwrap();
    }

    #[test]
    fn test_move_to_front_head_is_noop() {
        let mut ring = LruRing::new();
        ring.push_front("a");
        let b = ring.push_front("b");

        assert!(ring.move_to_front(b));

        assert_eq!(values(&ring), vec!["b", "a"]);
        ring.check_invariants().unwrap();
    }

    #[test]
    fn test_move_to_front_unknown_slot() {
        let mut ring = LruRing::new();
        let a = ring.push_front("a");
        ring.remove(a);

        assert!(!ring.move_to_front(a));
        assert!(!ring.move_to_front(SlotId(42)));
    }

    #[test]
    fn test_pop_back_until_empty() {
        let mut ring = LruRing::new();
        ring.push_front("a");
        ring.push_front("b");

        assert_eq!(ring.pop_back(), Some("a"));
        ring.check_invariants().unwrap();
        assert_eq!(ring.pop_back(), Some("b"));
        ring.check_invariants().unwrap();
        assert_eq!(ring.pop_back(), None);
        assert!(ring.is_empty());
        assert_eq!(ring.head(), None);
    }

    #[test]
    fn test_remove_each_topology() {
        // sole
        let mut ring = LruRing::new();
        let a = ring.push_front("a");
        assert_eq!(ring.remove(a), Some("a"));
        assert_eq!((ring.head(), ring.tail()), (None, None));
        ring.check_invariants().unwrap();

        // head
        let mut ring = LruRing::new();
        ring.push_front("a");
        ring.push_front("b");
        let c = ring.push_front("c");
        assert_eq!(ring.remove(c), Some("c"));
        assert_eq!(values(&ring), vec!["b", "a"]);
        ring.check_invariants().unwrap();

        // tail
        let mut ring = LruRing::new();
        let a = ring.push_front("a");
        ring.push_front("b");
        ring.push_front("c");
        assert_eq!(ring.remove(a), Some("a"));
        assert_eq!(values(&ring), vec!["c", "b"]);
        ring.check_invariants().unwrap();

        // interior
        let mut ring = LruRing::new();
        ring.push_front("a");
        let b = ring.push_front("b");
        ring.push_front("c");
        assert_eq!(ring.remove(b), Some("b"));
        assert_eq!(values(&ring), vec!["c", "a"]);
        ring.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_twice_returns_none() {
        let mut ring = LruRing::new();
        let a = ring.push_front("a");
        ring.push_front("b");

        assert_eq!(ring.remove(a), Some("a"));
        assert_eq!(ring.remove(a), None);
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut ring = LruRing::new();
        let a = ring.push_front("a");
        ring.push_front("b");
        ring.remove(a);

        let c = ring.push_front("c");

        assert_eq!(c.index(), a.index());
        assert_eq!(values(&ring), vec!["c", "b"]);
        ring.check_invariants().unwrap();
    }

    #[test]
    fn test_iter_is_bounded_by_len() {
        let mut ring = LruRing::new();
        ring.push_front("a");
        ring.push_front("b");
        ring.push_front("c");

        // Corrupt the count so the loop-back check alone would overrun it.
        ring.len = 2;

        assert_eq!(values(&ring), vec!["c", "b"]);
        assert!(ring.check_invariants().is_err());
    }

    #[test]
    fn test_check_invariants_detects_open_ring() {
        let mut ring = LruRing::new();
        let a = ring.push_front("a");
        ring.push_front("b");

        if let Some(node) = ring.slots[a.index()].as_mut() {
            node.next = a;
        }

        assert!(matches!(
            ring.check_invariants(),
            Err(CacheError::Invariant(_))
        ));
    }
}
