//! Sharded Cache
//!
//! [`Cache`] is the entry point of FlashCache. It owns a power-of-two number
//! of [`Shard`]s and routes every key to exactly one of them:
//!
//! ```text
//! key ──► hasher.sum64(key) ──► hash & mask ──► shards[index].op(key, ..)
//! ```
//!
//! Shards never talk to each other and there is no global lock, so operations
//! on keys living in different shards run fully in parallel.

use crate::config::CacheConfig;
use crate::error::Result;
use crate::hash::{KeyHasher, XxHash64};
use crate::storage::{Expiry, Shard, SweeperConfig};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// A sharded, in-process key-value cache with per-entry TTL.
///
/// # Thread Safety
///
/// All operations take `&self`; wrap the cache in an `Arc` to share it
/// across threads or tasks.
///
/// # Shutdown
///
/// When sweeping is enabled every shard runs a background task. Call
/// [`shutdown`](Cache::shutdown) to stop them all and wait for them to exit.
/// Dropping the cache signals them too, without waiting.
///
/// # Example
///
/// ```
/// use flashcache::{Cache, CacheConfig};
/// use std::time::Duration;
///
/// let config = CacheConfig::default().with_sweep_interval(Duration::ZERO);
/// let cache: Cache<String> = Cache::new(config).unwrap();
///
/// cache.set("name", "Ariz".to_string(), Duration::ZERO);
/// assert_eq!(cache.get("name"), Some("Ariz".to_string()));
///
/// assert!(cache.delete("name"));
/// assert!(!cache.delete("name"));
/// ```
pub struct Cache<V, H = XxHash64> {
    shards: Box<[Shard<V>]>,
    mask: u64,
    hasher: H,
}

impl<V, H> fmt::Debug for Cache<V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("shards", &self.shards.len())
            .field("mask", &self.mask)
            .finish()
    }
}

impl<V: Send + Sync + 'static> Cache<V> {
    /// Creates a cache using the default xxHash64 key hasher.
    ///
    /// Fails with [`CacheError::InvalidConfig`](crate::CacheError::InvalidConfig)
    /// if the configuration is rejected, and with
    /// [`CacheError::RuntimeUnavailable`](crate::CacheError::RuntimeUnavailable)
    /// if sweeping is enabled outside of a Tokio runtime.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_hasher(config, XxHash64::default())
    }
}

impl<V: Send + Sync + 'static, H: KeyHasher> Cache<V, H> {
    /// Creates a cache with a custom key hasher.
    pub fn with_hasher(config: CacheConfig, hasher: H) -> Result<Self> {
        config.validate()?;

        let sweeper = SweeperConfig::new(config.sweep_interval)
            .with_startup_delay(config.startup_delay_min, config.startup_delay_max);

        let shards = (0..config.shard_count)
            .map(|_| Shard::with_sweeper(sweeper))
            .collect::<Result<Vec<_>>>()?
            .into_boxed_slice();

        info!(
            shards = config.shard_count,
            sweep_interval_ms = config.sweep_interval.as_millis(),
            "Cache created"
        );

        Ok(Self {
            shards,
            mask: (config.shard_count - 1) as u64,
            hasher,
        })
    }
}

impl<V, H: KeyHasher> Cache<V, H> {
    /// Determines which shard a key belongs to.
    #[inline]
    pub fn shard_index(&self, key: &str) -> usize {
        (self.hasher.sum64(key.as_bytes()) & self.mask) as usize
    }

    /// Gets the shard for a given key.
    #[inline]
    fn shard(&self, key: &str) -> &Shard<V> {
        &self.shards[self.shard_index(key)]
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired. An expired key
    /// is removed by this call ("lazy expiry").
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.shard(key).get(key)
    }

    /// Stores a value under `key`, replacing any previous value.
    ///
    /// The key expires `ttl` from now; `Duration::ZERO` means it never
    /// expires.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        self.shard(&key).set(key, value, ttl);
    }

    /// Deletes a key.
    ///
    /// Returns `true` if the key was present, `false` otherwise.
    pub fn delete(&self, key: &str) -> bool {
        self.shard(key).delete(key)
    }

    /// Inspects a key's expiry without triggering lazy expiration.
    ///
    /// Returns `None` if the key is not stored.
    pub fn ttl(&self, key: &str) -> Option<Expiry> {
        self.shard(key).ttl(key)
    }

    /// Removes every entry from every shard.
    ///
    /// Shards are flushed one after another; a concurrent reader may observe
    /// a partially flushed cache.
    pub fn flush(&self) {
        for shard in self.shards.iter() {
            shard.flush();
        }
    }

    /// Runs an eviction pass on every shard right now.
    ///
    /// Returns the number of expired entries removed. Useful when background
    /// sweeping is disabled.
    pub fn evict_expired(&self) -> usize {
        self.shards.iter().map(Shard::evict).sum()
    }

    /// Number of stored entries across all shards.
    ///
    /// Includes expired entries that have not been reclaimed yet.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// Returns `true` if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Shard::is_empty)
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Number of shards whose sweeper task has not exited yet.
    pub fn active_sweepers(&self) -> usize {
        self.shards.iter().filter(|s| s.has_active_sweeper()).count()
    }

    /// Stops every background sweeper and waits until all have exited.
    ///
    /// Every sweeper is signalled before the first one is awaited, so even
    /// if this future is dropped midway, all sweepers still stop. Calling it
    /// again is a no-op. The cache remains usable afterwards; expired
    /// entries are then only reclaimed lazily or by
    /// [`evict_expired`](Cache::evict_expired).
    pub async fn shutdown(&self) {
        for shard in self.shards.iter() {
            shard.signal_stop();
        }

        for shard in self.shards.iter() {
            shard.shutdown().await;
        }

        debug!(shards = self.shards.len(), "Cache sweepers shut down");
    }
}
