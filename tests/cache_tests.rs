//! Integration tests for FlashCache
//!
//! These exercise the public API end to end, including the background
//! sweepers running on a Tokio runtime.

use flashcache::{Cache, CacheConfig, CacheError, Expiry};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flashcache=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Sweeping config that starts ticking right away.
fn swept(shards: usize, interval: Duration) -> CacheConfig {
    CacheConfig::default()
        .with_shard_count(shards)
        .with_sweep_interval(interval)
        .with_startup_delay(Duration::ZERO, Duration::ZERO)
}

fn unswept(shards: usize) -> CacheConfig {
    CacheConfig::default()
        .with_shard_count(shards)
        .with_sweep_interval(Duration::ZERO)
}

#[test]
fn test_invalid_shard_counts_are_rejected() {
    for bad in [0usize, 3, 5, 100] {
        let err = Cache::<String>::new(unswept(bad)).unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfig(_)), "{bad}: {err}");
    }
}

#[tokio::test]
async fn test_valid_shard_counts_with_sweepers() -> anyhow::Result<()> {
    init_tracing();

    for good in [1usize, 2, 4, 256, 1024] {
        let cache: Cache<String> = Cache::new(swept(good, Duration::from_secs(60)))?;
        assert_eq!(cache.shard_count(), good);
        assert_eq!(cache.active_sweepers(), good);
        cache.shutdown().await;
    }

    Ok(())
}

#[tokio::test]
async fn test_active_eviction_without_reads() -> anyhow::Result<()> {
    init_tracing();

    let cache: Cache<&'static str> = Cache::new(swept(4, Duration::from_millis(10)))?;

    cache.set("short", "value", Duration::from_millis(5));
    cache.set("persistent", "value", Duration::ZERO);
    assert_eq!(cache.len(), 2);

    sleep(Duration::from_millis(60)).await;

    // Never read "short", yet it is gone
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.ttl("short"), None);
    assert_eq!(cache.get("persistent"), Some("value"));

    cache.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_sweeper_reclaims_many_unread_keys() -> anyhow::Result<()> {
    init_tracing();

    let cache: Cache<u64> = Cache::new(swept(16, Duration::from_millis(10)))?;

    for i in 0..1000 {
        cache.set(format!("key{}", i), i, Duration::from_millis(20));
    }
    cache.set("persistent", 0, Duration::ZERO);
    assert_eq!(cache.len(), 1001);

    sleep(Duration::from_millis(150)).await;

    assert_eq!(cache.len(), 1);
    cache.shutdown().await;
    Ok(())
}

#[test]
fn test_lazy_deletion_on_read() -> anyhow::Result<()> {
    let cache: Cache<&'static str> = Cache::new(unswept(8))?;

    cache.set("key", "value", Duration::from_millis(5));
    std::thread::sleep(Duration::from_millis(20));

    // Expired but still physically present
    assert_eq!(cache.len(), 1);
    assert!(matches!(cache.ttl("key"), Some(Expiry::At(_))));

    assert_eq!(cache.get("key"), None);
    assert_eq!(cache.len(), 0);
    Ok(())
}

#[tokio::test]
async fn test_shutdown_guarantee() -> anyhow::Result<()> {
    init_tracing();

    let cache: Cache<&'static str> = Cache::new(swept(8, Duration::from_millis(5)))?;

    sleep(Duration::from_millis(20)).await;
    cache.shutdown().await;
    assert_eq!(cache.active_sweepers(), 0);

    // Nothing reclaims this key anymore except a read
    cache.set("key", "value", Duration::from_millis(1));
    sleep(Duration::from_millis(50)).await;
    assert_eq!(cache.len(), 1);

    assert_eq!(cache.get("key"), None);
    assert_eq!(cache.len(), 0);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_shutdown_calls() -> anyhow::Result<()> {
    let cache: Arc<Cache<u32>> = Arc::new(Cache::new(swept(8, Duration::from_millis(5)))?);

    let a = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.shutdown().await }
    });
    let b = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.shutdown().await }
    });

    a.await?;
    b.await?;
    assert_eq!(cache.active_sweepers(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_and_writers_with_sweeping() -> anyhow::Result<()> {
    init_tracing();

    let cache: Arc<Cache<usize>> = Arc::new(Cache::new(swept(32, Duration::from_millis(2)))?);
    let mut handles = vec![];

    for t in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::task::spawn_blocking(move || {
            for i in 0..500 {
                let key = format!("key:{}:{}", t, i);
                if i % 2 == 0 {
                    cache.set(key.clone(), i, Duration::ZERO);
                    assert_eq!(cache.get(&key), Some(i));
                } else {
                    cache.set(key.clone(), i, Duration::from_millis(1));
                }
            }
        }));
    }

    for handle in handles {
        handle.await?;
    }

    sleep(Duration::from_millis(50)).await;

    // Only the entries without TTL survive
    assert_eq!(cache.len(), 8 * 250);
    cache.shutdown().await;
    Ok(())
}

#[test]
fn test_flush_clears_every_shard() -> anyhow::Result<()> {
    let cache: Cache<String> = Cache::new(unswept(16))?;

    for i in 0..100 {
        cache.set(format!("key{}", i), i.to_string(), Duration::ZERO);
    }
    assert_eq!(cache.len(), 100);

    cache.flush();

    assert!(cache.is_empty());
    assert_eq!(cache.get("key1"), None);
    Ok(())
}

#[test]
fn test_results_do_not_depend_on_shard() -> anyhow::Result<()> {
    let one: Cache<u32> = Cache::new(unswept(1))?;
    let many: Cache<u32> = Cache::new(unswept(64))?;

    for (i, key) in ["alpha", "beta", "gamma", "delta"].iter().enumerate() {
        one.set(*key, i as u32, Duration::ZERO);
        many.set(*key, i as u32, Duration::ZERO);
    }

    for key in ["alpha", "beta", "gamma", "delta", "missing"] {
        assert_eq!(one.get(key), many.get(key));
        assert_eq!(one.delete(key), many.delete(key));
        assert_eq!(one.delete(key), many.delete(key));
    }

    Ok(())
}
