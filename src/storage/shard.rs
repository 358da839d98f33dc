//! Shard: an independently locked slice of the key space
//!
//! Every key lives in exactly one shard. A shard is a `HashMap` behind a
//! single `RwLock`, plus an optional background [`Sweeper`] that reclaims
//! expired entries nobody reads anymore.
//!
//! ## Expiry
//!
//! Entries are expired in two ways:
//!
//! 1. **Lazy**: `get` notices an expired entry, drops its read lock, takes the
//!    write lock and removes it. Callers never see an expired value.
//! 2. **Active**: `evict` scans the shard under the read lock, then removes
//!    the candidates under the write lock.
//!
//! ## Eviction Race
//!
//! Between the scan and the delete phase of `evict`, a writer may `set` one of
//! the candidate keys again with a fresh TTL. The delete phase re-checks each
//! candidate's expiry under the write lock and skips keys that are no longer
//! expired, so a fresh write is never discarded.
//!
//! ```text
//!   evict()                          set("k", v, 1h)
//!   ───────                          ───────────────
//!   read lock, collect ["k"]
//!   release
//!                                    write lock, insert, release
//!   write lock
//!   "k" no longer expired -> keep
//!   release
//! ```

use crate::error::Result;
use crate::storage::expiry::{Evict, Sweeper, SweeperConfig};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::{Duration, Instant};
use tracing::trace;

/// Expiration state of a stored key, as reported by `ttl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The key never expires.
    Never,
    /// The key expires (or expired) at this instant.
    At(Instant),
}

impl Expiry {
    /// Returns the expiry instant, or `None` for keys without a TTL.
    pub fn instant(&self) -> Option<Instant> {
        match self {
            Expiry::Never => None,
            Expiry::At(at) => Some(*at),
        }
    }

    /// Time left before expiry. `Some(Duration::ZERO)` once the instant passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.instant()
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}

/// A stored value with its optional expiry time.
#[derive(Debug, Clone)]
pub struct Item<V> {
    /// The stored value
    pub value: V,
    /// When this item expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl<V> Item<V> {
    /// Creates an item. A zero `ttl` means the item never expires.
    pub fn new(value: V, ttl: Duration) -> Self {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(Instant::now() + ttl)
        };

        Self { value, expires_at }
    }

    /// Checks whether the item has expired as of `now`.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }

    /// Checks whether the item has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Expiration state of the item.
    pub fn expiry(&self) -> Expiry {
        match self.expires_at {
            Some(at) => Expiry::At(at),
            None => Expiry::Never,
        }
    }
}

/// The locked map of a shard.
///
/// Kept behind an `Arc` so the shard's sweeper can hold a `Weak` handle to it.
#[derive(Debug)]
pub(crate) struct Store<V> {
    data: RwLock<HashMap<String, Item<V>>>,
}

impl<V> Store<V> {
    fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    // A panic while holding the lock can't leave the map half-updated:
    // every critical section is a single insert/remove/replace.
    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Item<V>>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Item<V>>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        // Fast path: read lock only
        {
            let data = self.read();
            match data.get(key) {
                None => return None,
                Some(item) if !item.is_expired() => return Some(item.value.clone()),
                Some(_) => {}
            }
        }

        // Expired - need the write lock to remove it
        let mut data = self.write();
        if let Some(item) = data.get(key) {
            if item.is_expired() {
                data.remove(key);
                trace!(key, "Lazily expired key");
                return None;
            }
            // Another writer replaced the key in between
            return Some(item.value.clone());
        }

        None
    }

    fn set(&self, key: String, value: V, ttl: Duration) {
        let item = Item::new(value, ttl);
        self.write().insert(key, item);
    }

    fn delete(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    fn ttl(&self, key: &str) -> Option<Expiry> {
        self.read().get(key).map(Item::expiry)
    }

    /// Scan phase of eviction: keys expired as of `now`.
    fn collect_expired(&self, now: Instant) -> Vec<String> {
        self.read()
            .iter()
            .filter(|(_, item)| item.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Delete phase of eviction. Candidates are re-checked under the write
    /// lock; keys that were re-set in the meantime are kept.
    fn remove_expired(&self, candidates: Vec<String>) -> usize {
        if candidates.is_empty() {
            return 0;
        }

        let mut data = self.write();
        let now = Instant::now();
        let mut removed = 0;

        for key in candidates {
            if data.get(&key).is_some_and(|item| item.is_expired_at(now)) {
                data.remove(&key);
                removed += 1;
            }
        }

        removed
    }

    fn evict(&self) -> usize {
        let candidates = self.collect_expired(Instant::now());
        self.remove_expired(candidates)
    }

    fn flush(&self) {
        *self.write() = HashMap::new();
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}

impl<V: Send + Sync + 'static> Evict for Store<V> {
    fn evict(&self) -> usize {
        Store::evict(self)
    }
}

/// A single shard of the cache.
///
/// Owns its store and, if sweeping is enabled, the sweeper bound to it. The
/// sweeper is signalled to stop when the shard is dropped; use
/// [`shutdown`](Shard::shutdown) to also wait for it to exit.
#[derive(Debug)]
pub struct Shard<V> {
    store: Arc<Store<V>>,
    sweeper: Option<Sweeper>,
}

impl<V> Default for Shard<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Shard<V> {
    /// Creates a shard without a background sweeper.
    ///
    /// Expired entries are then only reclaimed by `get` or explicit `evict`.
    pub fn new() -> Self {
        Self {
            store: Arc::new(Store::new()),
            sweeper: None,
        }
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired; an expired key
    /// is removed on the way out.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.store.get(key)
    }

    /// Stores a value, replacing any previous item under the same key.
    ///
    /// A zero `ttl` stores the value without expiry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.store.set(key.into(), value, ttl);
    }

    /// Deletes a key. Returns `true` if it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.store.delete(key)
    }

    /// Inspects a key's expiry without triggering lazy expiration.
    ///
    /// Returns `None` if the key is not stored.
    pub fn ttl(&self, key: &str) -> Option<Expiry> {
        self.store.ttl(key)
    }

    /// Removes every expired entry. Returns the number of entries removed.
    pub fn evict(&self) -> usize {
        self.store.evict()
    }

    /// Removes every entry, expired or not.
    pub fn flush(&self) {
        self.store.flush();
    }

    /// Number of stored entries, including expired ones not reclaimed yet.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the shard stores no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if this shard has a sweeper task that has not exited.
    pub fn has_active_sweeper(&self) -> bool {
        self.sweeper.as_ref().is_some_and(|s| !s.is_stopped())
    }

    /// Asks the sweeper to stop without waiting for it.
    pub(crate) fn signal_stop(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.signal_stop();
        }
    }

    /// Stops the sweeper and waits until its task has exited.
    ///
    /// Idempotent; a shard without a sweeper returns immediately.
    pub async fn shutdown(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop().await;
        }
    }
}

impl<V: Send + Sync + 'static> Shard<V> {
    /// Creates a shard with a background sweeper.
    ///
    /// A zero interval yields a shard without a sweeper. Starting a sweeper
    /// needs a Tokio runtime; without one this fails with
    /// [`CacheError::RuntimeUnavailable`](crate::CacheError::RuntimeUnavailable).
    pub fn with_sweeper(config: SweeperConfig) -> Result<Self> {
        let mut shard = Self::new();

        if !config.interval.is_zero() {
            let target: Weak<dyn Evict> = Arc::downgrade(&shard.store) as Weak<dyn Evict>;
            shard.sweeper = Some(Sweeper::start(target, config)?);
        }

        Ok(shard)
    }
}
