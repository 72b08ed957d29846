//! Shared Cache Module
//!
//! Thread-safe façade over [`CacheStore`]. Every call that can mutate the
//! store, including a lookup, holds the write lock for its whole duration.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::cache::{current_timestamp_ms, CacheStore, DeepCopy, Entry};
use crate::config::Config;
use crate::error::{CacheError, Result};

/// Capacity used by [`Cache::new`]
pub const DEFAULT_MAX_CAPACITY: usize = 10_000;

// == Cache ==
/// Named, bounded cache with LRU eviction and lazy TTL expiry.
///
/// Entries are copied on `put` and again on `get`, so the caller never holds
/// a reference into the cache.
///
/// ```
/// use lru_ttl_cache::{Cache, Entry};
///
/// let cache = Cache::with_capacity("sessions", 2).unwrap();
/// cache.put(&Entry::new("a".to_string(), "1".to_string()));
/// cache.put(&Entry::new("b".to_string(), "2".to_string()));
/// cache.put(&Entry::new("c".to_string(), "3".to_string()));
///
/// assert_eq!(cache.size(), 2);
/// assert!(cache.get("a").is_none());
/// assert_eq!(cache.get("c").unwrap().value(), "3");
/// ```
#[derive(Debug)]
pub struct Cache<K, V> {
    name: String,
    store: RwLock<CacheStore<K, V>>,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + DeepCopy,
    V: DeepCopy,
{
    // == Constructor ==
    /// Creates a cache holding up to [`DEFAULT_MAX_CAPACITY`] entries.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::with_capacity(name, DEFAULT_MAX_CAPACITY)
    }

    /// Creates a cache holding up to `max_capacity` entries.
    ///
    /// Fails with [`CacheError::InvalidArgument`] if `name` is empty or
    /// `max_capacity` is zero.
    pub fn with_capacity(name: impl Into<String>, max_capacity: usize) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CacheError::InvalidArgument(
                "cache name must not be empty".to_string(),
            ));
        }
        if max_capacity == 0 {
            return Err(CacheError::InvalidArgument(
                "max capacity must be positive".to_string(),
            ));
        }

        Ok(Self {
            name,
            store: RwLock::new(CacheStore::new(max_capacity)),
        })
    }

    /// Creates a cache from the name and capacity in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_capacity(config.cache_name.clone(), config.max_capacity)
    }

    // == Put ==
    /// Stores a copy of `candidate`.
    ///
    /// Returns `false` if the candidate is already expired or cannot be
    /// copied; the cache is unchanged in both cases.
    pub fn put(&self, candidate: &Entry<K, V>) -> bool {
        match self.try_put(candidate) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(cache = %self.name, error = %e, "put failed");
                false
            }
        }
    }

    /// Like [`Cache::put`], but reports a copy failure as an error.
    pub fn try_put(&self, candidate: &Entry<K, V>) -> Result<bool> {
        let entry = candidate.copy()?;
        if entry.is_expired() {
            debug!(cache = %self.name, "Rejected expired entry before locking");
            return Ok(false);
        }

        let mut store = self.store.write();
        Ok(store.insert(entry, current_timestamp_ms()))
    }

    // == Get ==
    /// Returns a detached copy of the live entry under `key`.
    ///
    /// A hit bumps the resident hit count and makes the entry the most
    /// recently used. An expired entry is removed and reported as `None`.
    pub fn get<Q>(&self, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.try_get(key) {
            Ok(found) => found,
            Err(e) => {
                warn!(cache = %self.name, error = %e, "get failed");
                None
            }
        }
    }

    /// Like [`Cache::get`], but reports a failed return copy as an error.
    pub fn try_get<Q>(&self, key: &Q) -> Result<Option<Entry<K, V>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut store = self.store.write();
        store.get(key, current_timestamp_ms())
    }

    // == Remove ==
    /// Removes the entry under `key`. Returns `true` if one was resident.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.write().remove(key)
    }

    // == Size ==
    /// Returns the number of resident entries.
    pub fn size(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_capacity(&self) -> usize {
        self.store.read().max_capacity()
    }

    /// Returns resident keys, most recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.store.read().keys()
    }

    /// Verifies the internal structure under a read lock.
    pub fn check_invariants(&self) -> Result<()> {
        self.store.read().check_invariants()
    }
}

impl<K, V: fmt::Display> Cache<K, V> {
    // == Render ==
    /// Lists values most recently used first, one per line.
    pub fn render(&self) -> String {
        self.store.read().render()
    }
}

impl<K, V: fmt::Display> fmt::Display for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Serialized;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn entry(key: &str, value: &str) -> Entry<String, String> {
        Entry::new(key.to_string(), value.to_string())
    }

    #[test]
    fn test_cache_new_defaults() {
        let cache: Cache<String, String> = Cache::new("default").unwrap();
        assert_eq!(cache.name(), "default");
        assert_eq!(cache.max_capacity(), DEFAULT_MAX_CAPACITY);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_rejects_empty_name() {
        let result = Cache::<String, String>::new("");
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_cache_rejects_zero_capacity() {
        let result = Cache::<String, String>::with_capacity("c", 0);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_cache_from_config() {
        let config = Config {
            cache_name: "configured".to_string(),
            max_capacity: 7,
            ..Config::default()
        };

        let cache: Cache<String, String> = Cache::from_config(&config).unwrap();
        assert_eq!(cache.name(), "configured");
        assert_eq!(cache.max_capacity(), 7);
    }

    #[test]
    fn test_put_copies_candidate() {
        let cache = Cache::with_capacity("c", 4).unwrap();
        let candidate = Entry::new("k".to_string(), vec![1u8, 2, 3]);

        assert!(cache.put(&candidate));

        let found = cache.get("k").unwrap();
        assert_eq!(found.value(), candidate.value());
        assert_ne!(found.value().as_ptr(), candidate.value().as_ptr());
    }

    #[test]
    fn test_put_copy_failure_leaves_cache_unchanged() {
        let cache = Cache::with_capacity("c", 4).unwrap();
        assert!(cache.put(&Entry::new("ok".to_string(), Serialized(1.5f64))));

        let bad = Entry::new("bad".to_string(), Serialized(f64::NAN));
        assert!(!cache.put(&bad));
        assert!(matches!(
            cache.try_put(&bad),
            Err(CacheError::CopyFailure(_))
        ));

        assert_eq!(cache.size(), 1);
        assert_eq!(cache.keys(), vec!["ok".to_string()]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_put_rejects_expired_candidate() {
        let cache = Cache::with_capacity("c", 4).unwrap();
        let candidate = Entry::with_ttl("k".to_string(), "v".to_string(), Duration::ZERO);

        // A copy restarts the clock, so only a zero TTL can be stale by the
        // time the lock is taken; either way the call must not panic.
        let _ = cache.put(&candidate);
        thread::sleep(Duration::from_millis(5));
        assert!(cache.get("k").is_none());
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_get_returns_distinct_copies() {
        let cache = Cache::with_capacity("c", 4).unwrap();
        cache.put(&entry("k", "value"));

        let first = cache.get("k").unwrap();
        let second = cache.get("k").unwrap();

        assert_eq!(first.value(), second.value());
        assert_ne!(first.value().as_ptr(), second.value().as_ptr());
        assert_eq!(second.hit_count(), 2);
    }

    #[test]
    fn test_remove() {
        let cache = Cache::with_capacity("c", 4).unwrap();
        cache.put(&entry("a", "1"));

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_render_and_display() {
        let cache = Cache::with_capacity("c", 4).unwrap();
        cache.put(&entry("a", "1"));
        cache.put(&entry("b", "2"));
        cache.put(&entry("c", "3"));
        cache.get("a");

        assert_eq!(cache.render(), "1\n3\n2\n");
        assert_eq!(cache.to_string(), cache.render());
    }

    #[test]
    fn test_concurrent_put_get_same_key() {
        let cache = Arc::new(Cache::with_capacity("c", 2).unwrap());
        cache.put(&entry("a", "a"));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for n in 0..200 {
                        if i % 2 == 0 {
                            cache.put(&entry("b", &format!("{}-{}", i, n)));
                        } else if let Some(found) = cache.get("b") {
                            assert!(!found.value().is_empty());
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Thread should not panic");
        }

        assert_eq!(cache.size(), 2);
        cache.check_invariants().unwrap();
    }
}
