//! # FlashCache - A Sharded In-Process Cache with TTL
//!
//! FlashCache is an embedded key-value cache for long-running processes such
//! as application servers. Keys are spread over independently locked shards,
//! every entry can carry a time-to-live, and each shard reclaims its expired
//! entries in the background.
//!
//! ## Features
//!
//! - **Sharded Storage**: a power-of-two number of shards, each behind its own RwLock
//! - **Generic Values**: the cache stores any `V`, no runtime type inspection
//! - **TTL Support**: entries expire after a per-entry duration, or never
//! - **Lazy + Active Expiry**: reads never return expired values, and a
//!   background sweeper per shard reclaims entries nobody reads again
//! - **Explicit Shutdown**: `shutdown().await` stops every sweeper and waits for it
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Cache                                │
//! │                                                                  │
//! │   key ──► KeyHasher::sum64 ──► hash & mask                       │
//! │                                     │                            │
//! │          ┌────────────┬─────────────┼─────────────┐              │
//! │          ▼            ▼             ▼             ▼              │
//! │     ┌─────────┐  ┌─────────┐   ┌─────────┐   ┌─────────┐         │
//! │     │ Shard 0 │  │ Shard 1 │   │ Shard 2 │   │ Shard N │         │
//! │     │ RwLock  │  │ RwLock  │   │ RwLock  │   │ RwLock  │         │
//! │     │ HashMap │  │ HashMap │   │ HashMap │   │ HashMap │         │
//! │     └────▲────┘  └────▲────┘   └────▲────┘   └────▲────┘         │
//! │          │            │             │             │              │
//! │     ┌────┴────┐  ┌────┴────┐   ┌────┴────┐   ┌────┴────┐         │
//! │     │ Sweeper │  │ Sweeper │   │ Sweeper │   │ Sweeper │         │
//! │     │ (Tokio) │  │ (Tokio) │   │ (Tokio) │   │ (Tokio) │         │
//! │     └─────────┘  └─────────┘   └─────────┘   └─────────┘         │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use flashcache::{Cache, CacheConfig};
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), flashcache::CacheError> {
//!     let config = CacheConfig::default()
//!         .with_shard_count(64)
//!         .with_sweep_interval(Duration::from_secs(1));
//!     let cache: Cache<String> = Cache::new(config)?;
//!
//!     cache.set("session", "token123".to_string(), Duration::from_secs(3600));
//!     assert_eq!(cache.get("session").as_deref(), Some("token123"));
//!
//!     // Stop every background sweeper before going away
//!     cache.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`cache`]: the sharded router, [`Cache`]
//! - [`storage`]: the per-shard store and its background sweeper
//! - [`config`]: construction parameters and their validation
//! - [`hash`]: the pluggable 64-bit key hasher
//! - [`error`]: the error type
//!
//! ## Design Highlights
//!
//! ### Thread Safety
//!
//! Each shard has its own RwLock and there is no global lock. Operations on
//! keys in different shards never block each other.
//!
//! ### Lazy + Active Expiry
//!
//! Keys with a TTL are expired in two ways:
//! 1. **Lazy**: when a key is read, we check whether it has expired
//! 2. **Active**: a background task per shard periodically scans for expired keys
//!
//! Sweepers start after a random delay so shards created together don't all
//! lock at the same instant.

pub mod cache;
pub mod config;
pub mod error;
pub mod hash;
pub mod storage;

// Re-export commonly used types for convenience
pub use cache::Cache;
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use hash::{KeyHasher, XxHash64};
pub use storage::{Expiry, Shard, Sweeper, SweeperConfig};

/// Version of FlashCache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
