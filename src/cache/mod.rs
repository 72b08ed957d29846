//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod copy;
mod entry;
mod ring;
mod shared;
mod store;


// Re-export public types
pub use copy::{DeepCopy, Serialized};
pub use entry::{current_timestamp_ms, Entry, DEFAULT_TTL};
pub use ring::{LruRing, SlotId};
pub use shared::{Cache, DEFAULT_MAX_CAPACITY};
pub use store::CacheStore;
