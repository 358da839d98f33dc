//! Storage Module
//!
//! This module provides the building blocks of the cache: the [`Shard`], a
//! `RwLock`-protected map with TTL support, and the [`Sweeper`], the background
//! task that actively evicts a shard's expired entries.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────┐
//! │          Shard            │
//! │  ┌─────────────────────┐  │
//! │  │ RwLock<HashMap<..>> │◄─┼──── get / set / delete / ttl / flush
//! │  └─────────────────────┘  │
//! │            ▲ Weak         │
//! │  ┌─────────┴───────────┐  │
//! │  │      Sweeper        │  │
//! │  │ (Background Tokio   │  │
//! │  │  Task, evict/tick)  │  │
//! │  └─────────────────────┘  │
//! └───────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use flashcache::storage::Shard;
//! use std::time::Duration;
//!
//! let shard = Shard::new();
//!
//! shard.set("name", "Ariz", Duration::ZERO);
//! assert_eq!(shard.get("name"), Some("Ariz"));
//!
//! shard.set("session", "token123", Duration::from_secs(3600));
//! assert!(shard.delete("session"));
//! ```

pub mod expiry;
pub mod shard;

// Re-export commonly used types
pub use expiry::{Sweeper, SweeperConfig};
pub use shard::{Expiry, Item, Shard};
