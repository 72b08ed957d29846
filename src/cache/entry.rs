//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::cache::DeepCopy;
use crate::error::Result;

// == Public Constants ==
/// TTL applied by [`Entry::new`]
pub const DEFAULT_TTL: Duration = Duration::from_millis(120_000);

// == Cache Entry ==
/// A key/value record with its own TTL and hit counter.
///
/// The expiry clock starts when the entry is constructed. Copies made by
/// [`Entry::copy`] start a fresh clock.
#[derive(Debug)]
pub struct Entry<K, V> {
    key: K,
    value: V,
    ttl: Duration,
    /// Creation timestamp (Unix milliseconds)
    created_at: u64,
    hit_count: AtomicU64,
}

impl<K, V> Entry<K, V> {
    // == Constructor ==
    /// Creates a new entry with the default TTL of 120 seconds.
    pub fn new(key: K, value: V) -> Self {
        Self::with_ttl(key, value, DEFAULT_TTL)
    }

    /// Creates a new entry that expires once `ttl` has elapsed.
    pub fn with_ttl(key: K, value: V, ttl: Duration) -> Self {
        Self {
            key,
            value,
            ttl,
            created_at: current_timestamp_ms(),
            hit_count: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry, returning its value.
    pub fn into_value(self) -> V {
        self.value
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creation timestamp in Unix milliseconds.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    // == Is Expired ==
    /// Checks if the entry has expired against the wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Checks expiry against `now` (Unix milliseconds).
    ///
    /// An entry is expired once strictly more than `ttl` has elapsed since
    /// creation, so an entry is still live at exactly `created_at + ttl`.
    pub fn is_expired_at(&self, now: u64) -> bool {
        u128::from(now.saturating_sub(self.created_at)) > self.ttl.as_millis()
    }

    // == Time To Live ==
    /// Returns the time left before expiry, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        let elapsed = Duration::from_millis(current_timestamp_ms().saturating_sub(self.created_at));
        self.ttl.saturating_sub(elapsed)
    }

    // == Hit Count ==
    pub fn hit_count(&self) -> u64 {
        self.hit_count.load(Ordering::Relaxed)
    }

    /// Records one successful lookup.
    pub fn increase_hit_count(&self) {
        self.hit_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_hit_count(&self, hits: u64) {
        self.hit_count.store(hits, Ordering::Relaxed);
    }
}

impl<K: DeepCopy, V: DeepCopy> Entry<K, V> {
    // == Copy ==
    /// Returns an independent copy with the same TTL and a fresh creation time.
    ///
    /// The copy starts with a zero hit count. Fails with
    /// [`CacheError::CopyFailure`](crate::CacheError::CopyFailure) if either
    /// the key or the value cannot be copied.
    pub fn copy(&self) -> Result<Self> {
        Ok(Self::with_ttl(
            self.key.deep_copy()?,
            self.value.deep_copy()?,
            self.ttl,
        ))
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Entry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.key, self.value)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as zero.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
