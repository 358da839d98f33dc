//! Background Expiry Sweeper
//!
//! Each shard with a positive sweep interval owns one sweeper: a Tokio task
//! that periodically calls the shard's `evict`. This is "active expiry", as
//! opposed to the "lazy expiry" `get` performs on access.
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry is cheap, but a key that expires and is never read again would
//! stay in memory forever. The sweeper reclaims those keys.
//!
//! ## Design
//!
//! The sweeper:
//! 1. Sleeps for a random startup delay, so shards created together don't
//!    all lock at the same instant
//! 2. Ticks at the configured interval and evicts expired keys on every tick
//! 3. Exits as soon as it is told to stop, or once its shard is gone
//!
//! The task only holds a `Weak` handle to the shard's store and never keeps
//! the shard alive. A pending stop always wins over a pending tick.

use crate::config::{MAX_STARTUP_DELAY, MIN_STARTUP_DELAY};
use crate::error::{CacheError, Result};
use rand::Rng;
use std::fmt;
use std::sync::Weak;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

/// Something a sweeper can reclaim expired entries from.
pub(crate) trait Evict: Send + Sync + 'static {
    /// Removes expired entries, returning how many were removed.
    fn evict(&self) -> usize;
}

/// Configuration for a single sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweeperConfig {
    /// Interval between sweeps (zero = no sweeper)
    pub interval: Duration,

    /// Lower bound of the random startup delay
    pub startup_delay_min: Duration,

    /// Upper bound (exclusive) of the random startup delay
    pub startup_delay_max: Duration,
}

impl SweeperConfig {
    /// Creates a config with the default 300ms..600ms startup delay.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            startup_delay_min: MIN_STARTUP_DELAY,
            startup_delay_max: MAX_STARTUP_DELAY,
        }
    }

    /// Sets the bounds of the random startup delay.
    pub fn with_startup_delay(mut self, min: Duration, max: Duration) -> Self {
        self.startup_delay_min = min;
        self.startup_delay_max = max;
        self
    }

    /// Draws a startup delay uniformly from `[min, max)`.
    ///
    /// Returns `min` when the range is empty.
    pub fn startup_delay(&self) -> Duration {
        if self.startup_delay_max > self.startup_delay_min {
            rand::thread_rng().gen_range(self.startup_delay_min..self.startup_delay_max)
        } else {
            self.startup_delay_min
        }
    }
}

/// A handle to a running sweeper.
///
/// Dropping the handle signals the task to stop; [`stop`](Sweeper::stop)
/// also waits for it to exit.
pub struct Sweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,

    /// Task handle, taken by the first `stop` call
    handle: Mutex<Option<JoinHandle<()>>>,

    interval: Duration,
}

impl fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sweeper")
            .field("interval", &self.interval)
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

impl Sweeper {
    /// Spawns the sweeper task on the current Tokio runtime.
    ///
    /// Fails with [`CacheError::RuntimeUnavailable`] when called outside a
    /// runtime.
    pub(crate) fn start(target: Weak<dyn Evict>, config: SweeperConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| CacheError::RuntimeUnavailable)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let delay = config.startup_delay();
        let handle = runtime.spawn(sweeper_loop(target, config.interval, delay, shutdown_rx));

        trace!(
            interval_ms = config.interval.as_millis(),
            delay_ms = delay.as_millis(),
            "Shard sweeper started"
        );

        Ok(Self {
            shutdown_tx,
            handle: Mutex::new(Some(handle)),
            interval: config.interval,
        })
    }

    /// The sweep interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` once a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Returns `true` once the sweeper task has exited.
    ///
    /// While another caller is still waiting in [`stop`](Sweeper::stop), the
    /// exit is not confirmed yet and this returns `false`.
    pub fn is_stopped(&self) -> bool {
        match self.handle.try_lock() {
            Ok(handle) => handle.as_ref().map_or(true, JoinHandle::is_finished),
            Err(_) => false,
        }
    }

    /// Requests a stop without waiting for the task to exit.
    pub fn signal_stop(&self) {
        // send_replace stores the value even if the task already exited
        self.shutdown_tx.send_replace(true);
    }

    /// Stops the sweeper and waits until its task has exited.
    ///
    /// Once this returns, no eviction is running or pending. Calling it again
    /// returns immediately; concurrent callers all return after the task
    /// exited. If this future is dropped before the task exited, the handle
    /// stays in place and the next call waits for it.
    pub async fn stop(&self) {
        self.signal_stop();

        let mut handle = self.handle.lock().await;
        if let Some(task) = handle.as_mut() {
            let result = task.await;
            *handle = None;

            if let Err(err) = result {
                // A panicked sweeper is still a stopped sweeper
                warn!(error = %err, "Shard sweeper terminated abnormally");
            }
            debug!("Shard sweeper stopped");
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop(
    target: Weak<dyn Evict>,
    interval: Duration,
    delay: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    tokio::select! {
        biased;
        _ = shutdown_rx.wait_for(|stop| *stop) => {
            trace!("Shard sweeper stopped before its first tick");
            return;
        }
        _ = time::sleep(delay) => {}
    }

    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            // Err means every sender is gone, which is a stop as well
            _ = shutdown_rx.wait_for(|stop| *stop) => {
                trace!("Shard sweeper received shutdown signal");
                return;
            }
            _ = ticker.tick() => {}
        }

        let Some(target) = target.upgrade() else {
            trace!("Shard dropped, sweeper exiting");
            return;
        };

        // The scan holds a blocking lock, keep it off the runtime's workers.
        // The loop waits for it, so a stop still waits for a running sweep.
        let expired = match task::spawn_blocking(move || target.evict()).await {
            Ok(expired) => expired,
            Err(err) => {
                warn!(error = %err, "Shard eviction failed");
                continue;
            }
        };

        if expired > 0 {
            debug!(expired = expired, "Expired keys cleaned up");
        } else {
            trace!("Sweep found no expired keys");
        }
    }
}
