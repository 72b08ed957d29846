//! LRU/TTL Cache - An embeddable in-memory cache
//!
//! Bounded by entry count with least-recently-used eviction, and lazy
//! per-entry TTL expiry checked on lookup.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, DeepCopy, Entry, Serialized, DEFAULT_MAX_CAPACITY, DEFAULT_TTL};
pub use config::Config;
pub use error::{CacheError, Result};
