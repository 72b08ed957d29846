//! Configuration Module
//!
//! Handles loading cache and smoke-test settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Label of the cache instance
    pub cache_name: String,
    /// Maximum number of entries the cache can hold
    pub max_capacity: usize,
    /// TTL in milliseconds for entries created by the smoke harness
    pub default_ttl_ms: u64,
    /// Number of concurrent writer threads in the smoke harness
    pub smoke_threads: usize,
    /// Puts per writer thread in the smoke harness
    pub smoke_iterations: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_NAME` - Cache label (default: "default")
    /// - `CACHE_MAX_CAPACITY` - Maximum cache entries (default: 10000)
    /// - `CACHE_DEFAULT_TTL_MS` - Entry TTL in milliseconds (default: 120000)
    /// - `SMOKE_THREADS` - Concurrent writers (default: 20)
    /// - `SMOKE_ITERATIONS` - Puts per writer (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_name: env::var("CACHE_NAME")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_name),
            max_capacity: parse_var("CACHE_MAX_CAPACITY").unwrap_or(defaults.max_capacity),
            default_ttl_ms: parse_var("CACHE_DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            smoke_threads: parse_var("SMOKE_THREADS").unwrap_or(defaults.smoke_threads),
            smoke_iterations: parse_var("SMOKE_ITERATIONS").unwrap_or(defaults.smoke_iterations),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_name: "default".to_string(),
            max_capacity: 10_000,
            default_ttl_ms: 120_000,
            smoke_threads: 20,
            smoke_iterations: 100,
        }
    }
}
