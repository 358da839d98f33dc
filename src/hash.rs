//! Key Hashing
//!
//! The cache maps every key to a shard with a 64-bit hash. Any hasher that is
//! deterministic within a process and spreads keys evenly over the 64-bit
//! space will do; [`XxHash64`] is the default.

/// Produces a 64-bit hash for a key.
///
/// Implementations must be total and deterministic for the lifetime of the
/// process. They need not be stable across processes or versions.
pub trait KeyHasher: Send + Sync + 'static {
    /// Hashes `key` to a 64-bit value.
    fn sum64(&self, key: &[u8]) -> u64;
}

/// xxHash64, see <https://cyan4973.github.io/xxHash/>.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XxHash64 {
    seed: u64,
}

impl XxHash64 {
    /// Creates a hasher with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    /// Returns the seed used by this hasher.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl KeyHasher for XxHash64 {
    #[inline]
    fn sum64(&self, key: &[u8]) -> u64 {
        twox_hash::XxHash64::oneshot(self.seed, key)
    }
}

impl<F> KeyHasher for F
where
    F: Fn(&[u8]) -> u64 + Send + Sync + 'static,
{
    #[inline]
    fn sum64(&self, key: &[u8]) -> u64 {
        self(key)
    }
}
