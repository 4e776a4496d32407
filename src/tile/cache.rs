//! Memo cache for tile paths.
//!
//! Tile paths are pure functions of the pyramid geometry and the tile
//! address, but Zoomify paths need a cumulative index over every earlier
//! level. The cache keeps recently computed paths so a full-pyramid dump
//! computes each one once.
//!
//! # Eviction
//!
//! The cache is an LRU bounded by entry count. An evicted path is simply
//! recomputed on its next lookup; recomputation always yields the same value.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;

use crate::error::PyramidError;
use crate::pyramid::TileAddress;

/// Default maximum number of cached paths.
pub const DEFAULT_PATH_CACHE_CAPACITY: usize = 65_536;

// =============================================================================
// Tile Path Cache
// =============================================================================

/// LRU cache of relative tile paths keyed by [`TileAddress`].
///
/// # Thread Safety
///
/// Lookups take a short-lived mutex; the cache can be shared across tasks.
/// Two tasks missing on the same key may both compute the path, which is
/// harmless because the computation is deterministic.
pub struct TilePathCache {
    cache: Mutex<LruCache<TileAddress, Arc<str>>>,
}

impl TilePathCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PATH_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` paths (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<TileAddress, Arc<str>>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get a cached path, marking it as recently used.
    pub fn get(&self, address: &TileAddress) -> Option<Arc<str>> {
        self.lock().get(address).cloned()
    }

    /// Get the path for `address`, computing and caching it on a miss.
    ///
    /// Errors from `compute` are returned as-is and nothing is cached.
    pub fn get_or_try_insert<F>(
        &self,
        address: TileAddress,
        compute: F,
    ) -> Result<Arc<str>, PyramidError>
    where
        F: FnOnce() -> Result<String, PyramidError>,
    {
        if let Some(path) = self.get(&address) {
            return Ok(path);
        }

        // Compute outside the lock
        let path: Arc<str> = Arc::from(compute()?);
        self.lock().put(address, Arc::clone(&path));
        Ok(path)
    }
}

impl Default for TilePathCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
