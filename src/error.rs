//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// A miss (absent or expired key) and a full cache are not errors: `get`
/// returns `None` and `put` evicts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Rejected constructor argument (empty cache name, zero capacity)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A key or value could not be deep-copied
    #[error("Copy failure: {0}")]
    CopyFailure(String),

    /// Internal structure check failed
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
