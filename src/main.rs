//! LRU/TTL Cache - smoke-test harness
//!
//! Exercises eviction order and concurrent access against a live cache and
//! exits non-zero if any check fails.

use std::thread;

use anyhow::{ensure, Context};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lru_ttl_cache::{Cache, Config, Entry};

fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lru_ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: name={}, max_capacity={}, default_ttl={}ms, threads={}, iterations={}",
        config.cache_name,
        config.max_capacity,
        config.default_ttl_ms,
        config.smoke_threads,
        config.smoke_iterations
    );

    eviction_scenario(&config)?;
    info!("Eviction scenario passed");

    concurrent_scenario(&config)?;
    info!("Concurrent scenario passed");

    Ok(())
}

/// Capacity 2: `a` falls out when `c` arrives, then `c` falls out once `b`
/// is touched and `a` comes back.
fn eviction_scenario(config: &Config) -> anyhow::Result<()> {
    let ttl = config.default_ttl();
    let a = Entry::with_ttl("a".to_string(), "a".to_string(), ttl);
    let b = Entry::with_ttl("b".to_string(), "b".to_string(), ttl);
    let c = Entry::with_ttl("c".to_string(), "c".to_string(), ttl);
    let cache = Cache::with_capacity(config.cache_name.clone(), 2)
        .context("Failed to create eviction cache")?;

    cache.put(&a);
    cache.put(&b);
    debug!("After a, b:\n{}", cache);
    ensure!(cache.size() == 2, "expected 2 entries, found {}", cache.size());

    cache.put(&c);
    debug!("After c:\n{}", cache);
    ensure!(cache.size() == 2, "expected 2 entries, found {}", cache.size());
    ensure!(cache.get("a").is_none(), "a should have been evicted");
    ensure!(cache.get("b").is_some(), "b should still be resident");

    cache.put(&a);
    debug!("After re-putting a:\n{}", cache);
    ensure!(cache.get("c").is_none(), "c should have been evicted");

    cache.check_invariants()?;
    Ok(())
}

/// Many writers put the same entry while reading it back.
fn concurrent_scenario(config: &Config) -> anyhow::Result<()> {
    let cache = Cache::from_config(config).context("Failed to create concurrent cache")?;
    let b = Entry::with_ttl("b".to_string(), "b".to_string(), config.default_ttl());

    thread::scope(|scope| {
        for _ in 0..config.smoke_threads {
            scope.spawn(|| {
                for _ in 0..config.smoke_iterations {
                    cache.put(&b);
                    let _ = cache.get("b");
                }
            });
        }
    });

    cache.check_invariants()?;
    ensure!(
        cache.size() <= 1,
        "expected at most one resident entry, found {}",
        cache.size()
    );
    info!("Final contents:\n{}", cache);
    Ok(())
}
