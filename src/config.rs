//! Cache Configuration
//!
//! [`CacheConfig`] holds the construction parameters of a [`Cache`](crate::Cache).
//! Values can be built in code, starting from [`CacheConfig::default`], or
//! loaded from environment variables with [`CacheConfig::from_env`].

use crate::error::{CacheError, Result};
use std::env;
use std::time::Duration;

/// Default number of shards.
pub const DEFAULT_SHARD_COUNT: usize = 256;

/// Default interval between two sweeps of the same shard.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Lower bound of the randomized sweeper startup delay.
pub const MIN_STARTUP_DELAY: Duration = Duration::from_millis(300);

/// Upper bound (exclusive) of the randomized sweeper startup delay.
pub const MAX_STARTUP_DELAY: Duration = Duration::from_millis(600);

/// Environment variable holding the shard count.
pub const ENV_SHARDS: &str = "FLASHCACHE_SHARDS";
/// Environment variable holding the sweep interval in milliseconds.
pub const ENV_SWEEP_MS: &str = "FLASHCACHE_SWEEP_MS";
/// Environment variable holding the minimum startup delay in milliseconds.
pub const ENV_STARTUP_DELAY_MIN_MS: &str = "FLASHCACHE_STARTUP_DELAY_MIN_MS";
/// Environment variable holding the maximum startup delay in milliseconds.
pub const ENV_STARTUP_DELAY_MAX_MS: &str = "FLASHCACHE_STARTUP_DELAY_MAX_MS";

/// Construction parameters for a [`Cache`](crate::Cache).
///
/// # Example
///
/// ```
/// use flashcache::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::default()
///     .with_shard_count(64)
///     .with_sweep_interval(Duration::from_secs(30));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Number of shards; must be a power of two
    pub shard_count: usize,

    /// Interval between sweeps of a shard (zero disables sweepers)
    pub sweep_interval: Duration,

    /// Lower bound of the sweeper startup delay
    pub startup_delay_min: Duration,

    /// Upper bound (exclusive) of the sweeper startup delay
    pub startup_delay_max: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            startup_delay_min: MIN_STARTUP_DELAY,
            startup_delay_max: MAX_STARTUP_DELAY,
        }
    }
}

impl CacheConfig {
    /// Sets the number of shards.
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Sets the sweep interval. `Duration::ZERO` disables background sweeping.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Sets the bounds of the randomized sweeper startup delay.
    pub fn with_startup_delay(mut self, min: Duration, max: Duration) -> Self {
        self.startup_delay_min = min;
        self.startup_delay_max = max;
        self
    }

    /// Returns `true` if sweepers will be started for this configuration.
    pub fn sweeping_enabled(&self) -> bool {
        !self.sweep_interval.is_zero()
    }

    /// Checks the configuration.
    ///
    /// Fails if the shard count is not a power of two (zero included) or if
    /// the startup delay bounds are inverted.
    pub fn validate(&self) -> Result<()> {
        if !self.shard_count.is_power_of_two() {
            return Err(CacheError::invalid(format!(
                "shard count {} is not a power of two",
                self.shard_count
            )));
        }

        if self.startup_delay_min > self.startup_delay_max {
            return Err(CacheError::invalid(format!(
                "startup delay minimum {:?} exceeds maximum {:?}",
                self.startup_delay_min, self.startup_delay_max
            )));
        }

        Ok(())
    }

    /// Boolean form of [`validate`](Self::validate).
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Loads a configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `FLASHCACHE_SHARDS` - Shard count (default: 256)
    /// - `FLASHCACHE_SWEEP_MS` - Sweep interval in ms, 0 disables (default: 600000)
    /// - `FLASHCACHE_STARTUP_DELAY_MIN_MS` - (default: 300)
    /// - `FLASHCACHE_STARTUP_DELAY_MAX_MS` - (default: 600)
    ///
    /// Unset variables fall back to their defaults. Unparsable or negative
    /// values are rejected, and the result is validated.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            shard_count: match env::var(ENV_SHARDS) {
                Ok(raw) => raw.trim().parse().map_err(|_| {
                    CacheError::invalid(format!("{ENV_SHARDS}={raw:?} is not a valid shard count"))
                })?,
                Err(_) => defaults.shard_count,
            },
            sweep_interval: duration_var(ENV_SWEEP_MS)?.unwrap_or(defaults.sweep_interval),
            startup_delay_min: duration_var(ENV_STARTUP_DELAY_MIN_MS)?
                .unwrap_or(defaults.startup_delay_min),
            startup_delay_max: duration_var(ENV_STARTUP_DELAY_MAX_MS)?
                .unwrap_or(defaults.startup_delay_max),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Reads a signed millisecond count, rejecting negative values.
fn duration_var(name: &str) -> Result<Option<Duration>> {
    let raw = match env::var(name) {
        Ok(raw) => raw,
        Err(_) => return Ok(None),
    };

    let millis: i64 = raw
        .trim()
        .parse()
        .map_err(|_| CacheError::invalid(format!("{name}={raw:?} is not a number")))?;

    if millis < 0 {
        return Err(CacheError::invalid(format!(
            "{name} must not be negative, got {millis}"
        )));
    }

    Ok(Some(Duration::from_millis(millis as u64)))
}
