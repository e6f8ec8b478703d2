//! # Ordered Index
//!
//! An ordered collection of (id, value) entries keyed by the engine's
//! monotonically increasing internal ids.
//!
//! ## Design
//!
//! - Based on crossbeam-skiplist for lock-free concurrent access
//! - Ids are assigned by the engine and never reused, so entry order is
//!   insertion order
//! - Forward scans are guarded against a successor that fails to advance,
//!   so a cyclic successor in the underlying list terminates the scan
//!   instead of looping

use std::ops::RangeFrom;

use crossbeam_skiplist::map::{Entry, Range};
use crossbeam_skiplist::SkipMap;

/// Ordered set of (id, value) entries.
///
/// Supports insertion, deletion by id, point lookup, and a lower-bound
/// forward scan. The skip list allows lookups concurrent with insertion,
/// which keeps `match_any` and `walk` readers in the synchronized engine.
pub(crate) struct OrderedIndex<V> {
    entries: SkipMap<u64, V>,
}

impl<V> OrderedIndex<V>
where
    V: Send + 'static,
{
    /// Creates an empty index.
    pub fn new() -> Self {
        Self { entries: SkipMap::new() }
    }

    /// Inserts an entry. The caller guarantees `id` has never been used.
    pub fn insert(&self, id: u64, value: V) {
        self.entries.insert(id, value);
    }

    /// Deletes the entry with the given id. Returns false if absent.
    pub fn remove(&self, id: u64) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Looks up the entry with the given id.
    pub fn get(&self, id: u64) -> Option<Entry<'_, u64, V>> {
        self.entries.get(&id)
    }

    /// Returns a guarded forward scan over all entries with id >= `start`,
    /// in ascending id order.
    pub fn scan_from(&self, start: u64) -> Scan<'_, V> {
        Scan { inner: self.entries.range(start..), prev: None }
    }
}

/// Forward scan over index entries in ascending id order.
///
/// Yields nothing further once a successor's id is not strictly greater than
/// the previous one. A total-order map never produces such a successor; the
/// guard defends against ordered-list primitives that wrap at end-of-list.
pub(crate) struct Scan<'a, V> {
    inner: Range<'a, u64, RangeFrom<u64>, u64, V>,
    prev: Option<u64>,
}

impl<'a, V> Iterator for Scan<'a, V>
where
    V: Send + 'static,
{
    type Item = Entry<'a, u64, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.inner.next()?;
        let id = *entry.key();
        if let Some(prev) = self.prev {
            if id <= prev {
                // Successor failed to advance: treat as end-of-index.
                return None;
            }
        }
        self.prev = Some(id);
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let index = OrderedIndex::new();
        index.insert(0, "a");
        index.insert(1, "b");

        assert_eq!(index.get(0).map(|e| *e.value()), Some("a"));
        assert_eq!(index.get(1).map(|e| *e.value()), Some("b"));
        assert!(index.get(2).is_none());
    }

    #[test]
    fn test_remove() {
        let index = OrderedIndex::new();
        index.insert(0, "a");

        assert!(index.remove(0));
        assert!(!index.remove(0));
        assert!(index.get(0).is_none());
    }

    #[test]
    fn test_scan_from_lower_bound() {
        let index = OrderedIndex::new();
        for id in [0u64, 2, 4, 6, 8] {
            index.insert(id, id * 10);
        }

        // Start between ids: the scan begins at the least id >= start.
        let ids: Vec<u64> = index.scan_from(3).map(|e| *e.key()).collect();
        assert_eq!(ids, vec![4, 6, 8]);
    }

    #[test]
    fn test_scan_is_ascending() {
        let index = OrderedIndex::new();
        for id in 0..100u64 {
            index.insert(id, id);
        }
        index.remove(17);
        index.remove(50);

        let ids: Vec<u64> = index.scan_from(0).map(|e| *e.key()).collect();
        assert_eq!(ids.len(), 98);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_scan_empty() {
        let index: OrderedIndex<u64> = OrderedIndex::new();
        assert_eq!(index.scan_from(0).count(), 0);
    }
}
