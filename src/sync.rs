//! Internally synchronized engine.
//!
//! Wraps the core engine in a readers-writer discipline: `add` and `remove`
//! are exclusive writers, while `len`, `match_any`, and `walk` are readers.
//! `match_any` stays a reader even though it catches filters up and reaps
//! stale ids, because that state is guarded by each cache entry's own lock.

use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::cache::CacheStats;
use crate::config::Options;
use crate::engine::SkipFilter;

/// A thread-safe [`SkipFilter`].
///
/// Safe to share across threads behind an `Arc`. Queries from concurrent
/// readers proceed in parallel; the first reader to touch a stale filter
/// catches it up while others wait on that entry alone.
///
/// The predicate and walk callbacks run while the engine read lock is held
/// and must not call back into the engine.
///
/// # Example
///
/// ```rust
/// use skipfilter::ConcurrentSkipFilter;
/// use std::sync::Arc;
/// use std::thread;
///
/// let members = Arc::new(ConcurrentSkipFilter::new(
///     |value: &u64, filter: &u64| value % filter == 0,
///     0,
/// ));
/// for i in 0..10 {
///     members.add(i);
/// }
///
/// let reader = {
///     let members = Arc::clone(&members);
///     thread::spawn(move || members.match_any(&[2]))
/// };
/// assert_eq!(reader.join().unwrap(), vec![0, 2, 4, 6, 8]);
/// ```
pub struct ConcurrentSkipFilter<V, K> {
    inner: RwLock<SkipFilter<V, K>>,
}

impl<V, K> ConcurrentSkipFilter<V, K>
where
    V: Clone + Eq + Hash + Send + 'static,
    K: Eq + Hash + Clone,
{
    /// Creates a new engine. Arguments as [`SkipFilter::new`].
    pub fn new<P>(predicate: P, filter_cache_capacity: usize) -> Self
    where
        P: Fn(&V, &K) -> bool + Send + Sync + 'static,
    {
        Self { inner: RwLock::new(SkipFilter::new(predicate, filter_cache_capacity)) }
    }

    /// Creates a new engine from validated options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// the options fail validation.
    pub fn with_options<P>(predicate: P, options: Options) -> crate::Result<Self>
    where
        P: Fn(&V, &K) -> bool + Send + Sync + 'static,
    {
        Ok(Self { inner: RwLock::new(SkipFilter::with_options(predicate, options)?) })
    }

    /// Adds a value to the set. Exclusive writer.
    pub fn add(&self, value: V) {
        self.inner.write().add(value)
    }

    /// Removes a value from the set. Exclusive writer.
    /// Returns false if the value was not present.
    pub fn remove(&self, value: &V) -> bool {
        self.inner.write().remove(value)
    }

    /// Returns the number of values in the set.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Returns the values matching any of the provided filters.
    /// Semantics as [`SkipFilter::match_any`].
    pub fn match_any(&self, filter_keys: &[K]) -> Vec<V> {
        self.inner.read().match_any(filter_keys)
    }

    /// Executes `callback` for each value in id order beginning at the least
    /// id >= `start`. Cursor semantics as [`SkipFilter::walk`].
    pub fn walk<F>(&self, start: u64, callback: F) -> u64
    where
        F: FnMut(&V) -> bool,
    {
        self.inner.read().walk(start, callback)
    }

    /// Returns statistics for the filter result cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.read().cache_stats()
    }

    /// Resets filter cache statistics to zero.
    pub fn reset_cache_stats(&self) {
        self.inner.read().reset_cache_stats()
    }

    /// Returns the capacity of the filter result cache.
    pub fn cache_capacity(&self) -> usize {
        self.inner.read().cache_capacity()
    }

    /// Returns the ids currently held in the cached bitmap for `key`.
    /// Diagnostic; semantics as [`SkipFilter::cached_ids`].
    pub fn cached_ids(&self, key: &K) -> Option<Vec<u64>> {
        self.inner.read().cached_ids(key)
    }
}

impl<V, K> fmt::Debug for ConcurrentSkipFilter<V, K>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentSkipFilter").field("inner", &*self.inner.read()).finish()
    }
}
