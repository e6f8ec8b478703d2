//! LRU (Least Recently Used) cache of per-filter match state.
//!
//! This module provides a thread-safe, size-capped cache mapping filter keys
//! to the bitmap of member ids known to pass that filter.

use parking_lot::{Mutex, MutexGuard, RwLock};
use roaring::RoaringTreemap;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for cache performance monitoring.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Total number of cache lookups
    pub lookups: u64,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of insertions
    pub insertions: u64,
    /// Number of evictions
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }

    /// Reset all statistics to zero
    pub fn reset(&mut self) {
        self.lookups = 0;
        self.hits = 0;
        self.misses = 0;
        self.insertions = 0;
        self.evictions = 0;
    }
}

/// Cached match state for a single filter.
///
/// `watermark` is the engine id counter value up to which this filter has
/// been evaluated; `ids` holds every id below the watermark that passed the
/// predicate and has not yet been reaped after removal. Ids at or above the
/// watermark are never present.
///
/// The bitmap and watermark are mutated under the per-entry mutex while the
/// owning engine is held by readers; the watermark can be compared against
/// the id counter without taking the mutex.
pub(crate) struct CachedFilter {
    watermark: AtomicU64,
    ids: Mutex<RoaringTreemap>,
}

impl CachedFilter {
    /// Creates an empty entry with watermark 0.
    pub(crate) fn new() -> Self {
        Self { watermark: AtomicU64::new(0), ids: Mutex::new(RoaringTreemap::new()) }
    }

    /// Returns the id up to which this filter has been evaluated.
    pub(crate) fn watermark(&self) -> u64 {
        self.watermark.load(Ordering::Acquire)
    }

    /// Locks and returns the id bitmap.
    pub(crate) fn lock_ids(&self) -> MutexGuard<'_, RoaringTreemap> {
        self.ids.lock()
    }

    /// Advances the watermark. Call only while holding the id bitmap lock,
    /// after a catch-up scan ran to completion.
    pub(crate) fn set_watermark(&self, to: u64) {
        self.watermark.store(to, Ordering::Release);
    }

    /// Unions this filter's ids into `out`.
    pub(crate) fn union_into(&self, out: &mut RoaringTreemap) {
        *out |= &*self.ids.lock();
    }

    /// Removes ids that no longer resolve in the ordered index.
    pub(crate) fn reap(&self, stale: &[u64]) {
        let mut ids = self.ids.lock();
        for &id in stale {
            ids.remove(id);
        }
    }
}

/// Thread-safe LRU cache from filter key to cached match state.
///
/// Uses a HashMap for O(1) lookups and a VecDeque for maintaining LRU order.
/// A lookup counts as an access. On eviction the entry is dropped entirely;
/// the next query against that filter rebuilds it from watermark 0.
pub(crate) struct FilterCache<K> {
    /// Maximum number of cached filters
    capacity: usize,
    /// Cache entries stored by filter key
    entries: RwLock<HashMap<K, Arc<CachedFilter>>>,
    /// LRU queue (most recently used at the back)
    recency: RwLock<VecDeque<K>>,
    /// Cache statistics
    stats: RwLock<CacheStats>,
}

impl<K> FilterCache<K>
where
    K: Eq + std::hash::Hash + Clone,
{
    /// Creates a new cache holding at most `capacity` filters.
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "filter cache capacity must be > 0");
        Self {
            capacity,
            entries: RwLock::new(HashMap::new()),
            recency: RwLock::new(VecDeque::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Returns the cached entry for `key`, creating it (watermark 0, empty
    /// bitmap) on first use. Counts as an access and may evict the least
    /// recently used filter.
    pub(crate) fn get_or_insert(&self, key: &K) -> Arc<CachedFilter> {
        {
            let mut stats = self.stats.write();
            stats.lookups += 1;
        }

        {
            let entries = self.entries.read();
            if let Some(filter) = entries.get(key) {
                let filter = Arc::clone(filter);
                drop(entries); // Release read lock before touching the queue

                self.touch(key);

                let mut stats = self.stats.write();
                stats.hits += 1;
                return filter;
            }
        }

        let mut entries = self.entries.write();

        // Another thread may have inserted while the read lock was released
        if let Some(filter) = entries.get(key) {
            let filter = Arc::clone(filter);
            drop(entries);

            self.touch(key);

            let mut stats = self.stats.write();
            stats.hits += 1;
            return filter;
        }

        let filter = Arc::new(CachedFilter::new());
        entries.insert(key.clone(), Arc::clone(&filter));

        let mut evicted = 0u64;
        {
            let mut recency = self.recency.write();
            recency.push_back(key.clone());

            while entries.len() > self.capacity {
                match recency.pop_front() {
                    Some(victim) => {
                        if entries.remove(&victim).is_some() {
                            evicted += 1;
                        }
                    }
                    None => break,
                }
            }
        }
        drop(entries);

        {
            let mut stats = self.stats.write();
            stats.misses += 1;
            stats.insertions += 1;
            stats.evictions += evicted;
        }
        filter
    }

    /// Returns the cached entry for `key` without counting an access or
    /// updating recency. Diagnostic use only.
    pub(crate) fn peek(&self, key: &K) -> Option<Arc<CachedFilter>> {
        self.entries.read().get(key).cloned()
    }

    /// Touch a key to mark it as recently used.
    ///
    /// # Performance Note
    ///
    /// This operation is O(n) due to linear search in VecDeque. For typical
    /// filter cardinalities this is dwarfed by predicate evaluation; for very
    /// large caches (>10K live filters), consider a more efficient structure.
    fn touch(&self, key: &K) {
        let mut recency = self.recency.write();

        if let Some(pos) = recency.iter().position(|k| k == key) {
            recency.remove(pos);
        }

        recency.push_back(key.clone());
    }

    /// Get current cache statistics.
    pub(crate) fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    /// Reset cache statistics to zero.
    pub(crate) fn reset_stats(&self) {
        let mut stats = self.stats.write();
        stats.reset();
    }

    /// Get the number of cached filters.
    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Get the cache capacity.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}
