//! Error types for FlashCache
//!
//! Construction is the only place the cache can fail. Every data-plane
//! operation (`get`, `set`, `delete`, `flush`) is infallible; absence of a
//! key is reported through `Option`/`bool`, never through an error.

use thiserror::Error;

/// Errors that can occur when building a [`Cache`](crate::Cache).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The configuration was rejected (non power-of-two shard count,
    /// negative sweep interval, inverted startup delay bounds, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Background sweeping was requested outside of a Tokio runtime.
    #[error("background sweeping requires a running Tokio runtime")]
    RuntimeUnavailable,
}

impl CacheError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CacheError::InvalidConfig(msg.into())
    }
}

/// Convenience Result type for FlashCache.
pub type Result<T> = std::result::Result<T, CacheError>;
