//! Cache Store Module
//!
//! Main cache engine combining HashMap indexing with the recency ring and TTL
//! expiration. The store is single-threaded; [`Cache`](crate::Cache) wraps it
//! in a lock.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::debug;

use crate::cache::{DeepCopy, Entry, LruRing, SlotId};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Index plus recency ring with a fixed capacity.
///
/// `count`, the index size and the ring length move together inside every
/// mutating method.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key to ring slot
    index: HashMap<K, SlotId>,
    /// Entries ordered by recency
    ring: LruRing<Entry<K, V>>,
    /// Number of resident entries
    count: usize,
    /// Maximum number of entries allowed
    max_capacity: usize,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty store holding at most `max_capacity` entries.
    pub fn new(max_capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(max_capacity),
            ring: LruRing::with_capacity(max_capacity),
            count: 0,
            max_capacity,
        }
    }

    // == Insert ==
    /// Stores an already-copied entry at the most recently used position.
    ///
    /// An existing entry under the same key is removed first, so the new one
    /// gets a fresh position. At capacity, the least recently used entry is
    /// evicted. Returns `false` without touching the store if the entry is
    /// expired at `now` or the store has no capacity.
    pub fn insert(&mut self, entry: Entry<K, V>, now: u64) -> bool {
        if self.max_capacity == 0 {
            return false;
        }
        if entry.is_expired_at(now) {
            debug!("Rejected expired entry");
            return false;
        }

        if let Some(&id) = self.index.get(entry.key()) {
            debug!("Replacing existing entry");
            self.remove_slot(id);
        }

        if self.count >= self.max_capacity {
            self.evict_tail();
        }

        let key = entry.key().clone();
        let id = self.ring.push_front(entry);
        self.index.insert(key, id);
        self.count += 1;
        true
    }

    // == Lookup ==
    /// Looks up `key`, refreshing its recency on a hit.
    ///
    /// An expired entry is removed and reported as a miss. On a hit the
    /// resident hit counter is bumped and the entry's slot is moved to the
    /// head; `on_hit` then sees the resident entry.
    pub fn lookup<Q, R>(
        &mut self,
        key: &Q,
        now: u64,
        on_hit: impl FnOnce(&Entry<K, V>) -> R,
    ) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        let expired = self.ring.get(id).map(|entry| entry.is_expired_at(now))?;
        if expired {
            debug!("Removing expired entry on lookup");
            self.remove_slot(id);
            return None;
        }

        self.ring.move_to_front(id);
        let entry = self.ring.get(id)?;
        entry.increase_hit_count();
        Some(on_hit(entry))
    }

    // == Remove ==
    /// Removes the entry stored under `key`. Returns `true` if one existed.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key) {
            Some(&id) => self.remove_slot(id).is_some(),
            None => false,
        }
    }

    /// Unlinks a slot, drops it from the index and decrements the count.
    fn remove_slot(&mut self, id: SlotId) -> Option<Entry<K, V>> {
        let entry = self.ring.remove(id)?;
        self.index.remove(entry.key());
        self.count -= 1;
        Some(entry)
    }

    // == Evict Tail ==
    /// Evicts the least recently used entry.
    fn evict_tail(&mut self) -> Option<Entry<K, V>> {
        let id = self.ring.tail()?;
        let evicted = self.remove_slot(id);
        if evicted.is_some() {
            debug!(max_capacity = self.max_capacity, "Evicted least recently used entry");
        }
        evicted
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    // == Keys ==
    /// Returns resident keys, most recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.ring
            .iter()
            .map(|(_, entry)| entry.key().clone())
            .collect()
    }

    // == Check Invariants ==
    /// Verifies that the count, the index and the ring describe the same set
    /// of entries and that the ring is closed.
    pub fn check_invariants(&self) -> Result<()> {
        self.ring.check_invariants()?;

        if self.count != self.index.len() || self.count != self.ring.len() {
            return Err(CacheError::Invariant(format!(
                "count {} index {} ring {}",
                self.count,
                self.index.len(),
                self.ring.len()
            )));
        }
        if self.count > self.max_capacity {
            return Err(CacheError::Invariant(format!(
                "count {} exceeds max capacity {}",
                self.count, self.max_capacity
            )));
        }
        for (id, entry) in self.ring.iter() {
            if self.index.get(entry.key()) != Some(&id) {
                return Err(CacheError::Invariant(format!(
                    "slot {} is not indexed under its key",
                    id.index()
                )));
            }
        }
        Ok(())
    }
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone + DeepCopy,
    V: DeepCopy,
{
    // == Get ==
    /// Returns a detached copy of the live entry under `key`.
    ///
    /// The copy carries the resident hit count. A copy failure leaves the
    /// hit recorded and is returned as an error.
    pub fn get<Q>(&mut self, key: &Q, now: u64) -> Result<Option<Entry<K, V>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup(key, now, |entry| -> Result<Entry<K, V>> {
            let copy = entry.copy()?;
            copy.set_hit_count(entry.hit_count());
            Ok(copy)
        })
        .transpose()
    }
}

impl<K, V: fmt::Display> CacheStore<K, V> {
    // == Render ==
    /// Lists values most recently used first, one per line.
    pub fn render(&self) -> String {
        self.ring
            .iter()
            .map(|(_, entry)| format!("{}\n", entry.value()))
            .collect()
    }
}
