//! # SkipFilter Engine
//!
//! The core indexed set: an ordered index of (id, value) entries combined
//! with an LRU cache of per-filter roaring bitmaps.
//!
//! ## Design
//!
//! - Every added value is tagged with a fresh id from a monotonically
//!   increasing counter; ids are never reused, even across removals
//! - Each cached filter remembers a watermark: the counter value up to which
//!   it has been evaluated. A query only runs the predicate over entries
//!   added since the watermark
//! - Removal never touches cached bitmaps. A removed id becomes a stale
//!   tombstone inside any bitmap holding it and is reaped by the next query
//!   that materializes it
//!
//! This type is externally synchronized: mutating operations take `&mut
//! self` and the caller serializes them. For the internally synchronized
//! configuration see [`ConcurrentSkipFilter`](crate::ConcurrentSkipFilter).

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use roaring::RoaringTreemap;

use crate::cache::{CacheStats, CachedFilter, FilterCache};
use crate::config::{Options, DEFAULT_FILTER_CACHE_CAPACITY};
use crate::index::OrderedIndex;

/// An indexed set of values with cached filter matching.
///
/// Values are tested against filters by a user-supplied predicate; the
/// result of testing every member against a given filter is accumulated in
/// a compressed bitmap so that repeating the query costs O(result size)
/// instead of O(members).
///
/// The predicate must be deterministic for a (value, filter) pair for the
/// life of that filter's cache entry; a predicate closing over mutable
/// state silently diverges the cache from the truth. It must not call back
/// into the engine.
///
/// # Example
///
/// ```rust
/// use skipfilter::SkipFilter;
///
/// let mut members = SkipFilter::new(|value: &u64, filter: &u64| value % filter == 0, 0);
/// for i in 0..10 {
///     members.add(i);
/// }
///
/// assert_eq!(members.match_any(&[2]), vec![0, 2, 4, 6, 8]);
/// assert_eq!(members.match_any(&[3]), vec![0, 3, 6, 9]);
/// ```
pub struct SkipFilter<V, K> {
    /// Next id to assign; incremented once per add, never reused
    next_id: u64,
    /// Ordered (id, value) entries
    index: OrderedIndex<V>,
    /// Value to its currently assigned id
    ids: HashMap<V, u64>,
    /// LRU cache of per-filter match state
    filters: FilterCache<K>,
    /// Returns true if the value passes the filter
    predicate: Box<dyn Fn(&V, &K) -> bool + Send + Sync>,
}

impl<V, K> SkipFilter<V, K>
where
    V: Clone + Eq + Hash + Send + 'static,
    K: Eq + Hash + Clone,
{
    /// Creates a new engine.
    ///
    /// # Arguments
    ///
    /// * `predicate` - Returns true if the value passes the provided filter.
    /// * `filter_cache_capacity` - Size of the filter result cache; 0 selects
    ///   the default of 100,000. Should be tuned to match or exceed the
    ///   expected filter cardinality.
    ///
    /// # Example
    ///
    /// ```rust
    /// use skipfilter::SkipFilter;
    ///
    /// let mut members = SkipFilter::new(|value: &u64, filter: &u64| value % filter == 0, 0);
    /// members.add(6);
    /// assert_eq!(members.match_any(&[3]), vec![6]);
    /// ```
    pub fn new<P>(predicate: P, filter_cache_capacity: usize) -> Self
    where
        P: Fn(&V, &K) -> bool + Send + Sync + 'static,
    {
        let capacity = if filter_cache_capacity == 0 {
            DEFAULT_FILTER_CACHE_CAPACITY
        } else {
            filter_cache_capacity
        };
        Self {
            next_id: 0,
            index: OrderedIndex::new(),
            ids: HashMap::new(),
            filters: FilterCache::new(capacity),
            predicate: Box::new(predicate),
        }
    }

    /// Creates a new engine from validated options.
    ///
    /// Unlike [`new`](Self::new), a zero cache capacity is rejected instead
    /// of being normalized to the default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// the options fail validation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use skipfilter::{Options, SkipFilter};
    ///
    /// # fn main() -> Result<(), skipfilter::Error> {
    /// let members = SkipFilter::with_options(
    ///     |value: &String, topic: &String| value.contains(topic.as_str()),
    ///     Options::new().filter_cache_capacity(1024),
    /// )?;
    /// assert!(members.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_options<P>(predicate: P, options: Options) -> crate::Result<Self>
    where
        P: Fn(&V, &K) -> bool + Send + Sync + 'static,
    {
        options.validate()?;
        Ok(Self {
            next_id: 0,
            index: OrderedIndex::new(),
            ids: HashMap::new(),
            filters: FilterCache::new(options.filter_cache_capacity),
            predicate: Box::new(predicate),
        })
    }

    /// Adds a value to the set, assigning it a fresh id.
    ///
    /// Adding a value that is already present is caller misuse and is not
    /// detected: the value's map slot is overwritten with the newer id while
    /// the ordered index keeps both entries.
    pub fn add(&mut self, value: V) {
        let id = self.next_id;
        self.index.insert(id, value.clone());
        self.ids.insert(value, id);
        self.next_id += 1;
    }

    /// Removes a value from the set. Returns false if it was not present.
    ///
    /// Cached filter bitmaps are not touched: the removed id lingers in any
    /// bitmap holding it until a later query reaps it.
    pub fn remove(&mut self, value: &V) -> bool {
        match self.ids.remove(value) {
            Some(id) => {
                self.index.remove(id);
                true
            }
            None => false,
        }
    }

    /// Returns the number of values in the set.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the values matching any of the provided filters.
    ///
    /// Each filter's cached bitmap is first caught up from its watermark by
    /// running the predicate over entries added since the filter was last
    /// queried. The bitmaps are unioned, and the union is materialized in
    /// ascending id order; ids that no longer resolve (their value was
    /// removed) are reaped from every bitmap that contributed to this query.
    ///
    /// The returned order is deterministic for a given engine state: values
    /// appear in insertion (id) order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use skipfilter::SkipFilter;
    ///
    /// let mut members = SkipFilter::new(|value: &u64, filter: &u64| value % filter == 0, 0);
    /// for i in 0..10 {
    ///     members.add(i);
    /// }
    ///
    /// // Union over several filters; ids collapse duplicates naturally.
    /// assert_eq!(members.match_any(&[2, 3]), vec![0, 2, 3, 4, 6, 8, 9]);
    /// ```
    pub fn match_any(&self, filter_keys: &[K]) -> Vec<V> {
        if filter_keys.is_empty() {
            return Vec::new();
        }

        let mut contributors = Vec::with_capacity(filter_keys.len());
        for key in filter_keys {
            let filter = self.filters.get_or_insert(key);
            self.refresh(&filter, key);
            contributors.push(filter);
        }

        let mut union = RoaringTreemap::new();
        for filter in &contributors {
            filter.union_into(&mut union);
        }

        let mut values = Vec::with_capacity(union.len() as usize);
        let mut stale = Vec::new();
        for id in union.iter() {
            match self.index.get(id) {
                Some(entry) => values.push(entry.value().clone()),
                None => stale.push(id),
            }
        }

        if !stale.is_empty() {
            // Clean up references to removed values. Non-contributing
            // filters holding a stale id reap it on their own next query.
            for filter in &contributors {
                filter.reap(&stale);
            }
        }

        values
    }

    /// Executes `callback` for each value in the set in ascending id order,
    /// beginning at the least id >= `start`.
    ///
    /// Return true from the callback to continue iterating, false to stop.
    /// The returned cursor resumes iteration strictly after the last
    /// delivered element when passed back as `start`; if nothing was
    /// delivered, `start` is returned unchanged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use skipfilter::SkipFilter;
    ///
    /// let mut members = SkipFilter::new(|_: &u64, _: &u64| true, 0);
    /// for i in 0..10 {
    ///     members.add(i);
    /// }
    ///
    /// let mut seen = Vec::new();
    /// let cursor = members.walk(0, |value| {
    ///     seen.push(*value);
    ///     seen.len() < 5
    /// });
    /// assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    ///
    /// // Resume strictly after the last delivered element.
    /// let mut rest = Vec::new();
    /// members.walk(cursor, |value| {
    ///     rest.push(*value);
    ///     true
    /// });
    /// assert_eq!(rest, vec![5, 6, 7, 8, 9]);
    /// ```
    pub fn walk<F>(&self, start: u64, mut callback: F) -> u64
    where
        F: FnMut(&V) -> bool,
    {
        let mut last_delivered = None;
        for entry in self.index.scan_from(start) {
            let id = *entry.key();
            if !callback(entry.value()) {
                return id + 1;
            }
            last_delivered = Some(id);
        }
        match last_delivered {
            Some(id) => id + 1,
            None => start,
        }
    }

    /// Returns statistics for the filter result cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.filters.stats()
    }

    /// Resets filter cache statistics to zero.
    pub fn reset_cache_stats(&self) {
        self.filters.reset_stats()
    }

    /// Returns the capacity of the filter result cache.
    pub fn cache_capacity(&self) -> usize {
        self.filters.capacity()
    }

    /// Returns the ids currently held in the cached bitmap for `key`, or
    /// None if the filter is not cached.
    ///
    /// Diagnostic: does not count as a cache access and does not catch the
    /// filter up, so the result may include ids of removed values that have
    /// not been reaped yet.
    pub fn cached_ids(&self, key: &K) -> Option<Vec<u64>> {
        self.filters.peek(key).map(|filter| filter.lock_ids().iter().collect())
    }

    /// Catches `filter` up to the current id counter.
    fn refresh(&self, filter: &CachedFilter, key: &K) {
        if filter.watermark() >= self.next_id {
            return;
        }

        let mut ids = filter.lock_ids();
        // Re-read under the lock: a concurrent query may have caught this
        // filter up while we waited.
        let start = filter.watermark();
        if start >= self.next_id {
            return;
        }

        for entry in self.index.scan_from(start) {
            if (self.predicate)(entry.value(), key) {
                ids.insert(*entry.key());
            }
        }

        // The watermark advances only after a completed scan; if the
        // predicate panicked above, the next query rescans from the old
        // watermark.
        filter.set_watermark(self.next_id);
    }
}

impl<V, K> fmt::Debug for SkipFilter<V, K>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipFilter")
            .field("len", &self.ids.len())
            .field("next_id", &self.next_id)
            .field("cached_filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}
