//! # SkipFilter - An Indexed Set with Cached Filter Matching
//!
//! SkipFilter combines an ordered skip list of members with an LRU cache of
//! roaring bitmaps, one per filter. It answers "which of my members pass
//! filter F?" where filter evaluation is a user-supplied predicate, and it
//! evaluates the predicate for each (member, filter) pair at most once:
//! repeated queries against the same filter cost O(result size) rather than
//! O(members).
//!
//! The motivating use case is matching a multi-topic message stream against
//! a large population of subscribers, each carrying a list of topic-pattern
//! subscriptions. The skip list provides an efficient discontinuous view of
//! the subscribers, and the bitmap cached for each topic is the ordered set
//! of subscribers that want messages on it.
//!
//! ## Architecture
//!
//! - **Ordered index**: skip list of (id, value) entries; ids come from a
//!   monotonic counter and are never reused
//! - **Filter cache**: bounded LRU from filter key to a watermarked bitmap
//!   of matching ids, refreshed incrementally as members are added
//! - **Lazy reaping**: removing a member never touches cached bitmaps; a
//!   stale id is dropped by the next query that fails to resolve it
//! - **Two synchronization disciplines**: [`SkipFilter`] assumes the caller
//!   serializes writers, [`ConcurrentSkipFilter`] guards the engine with a
//!   readers-writer lock
//!
//! ## Example Usage
//!
//! ```rust
//! use skipfilter::SkipFilter;
//!
//! let mut members = SkipFilter::new(|value: &u64, filter: &u64| value % filter == 0, 0);
//! for i in 0..10 {
//!     members.add(i);
//! }
//!
//! // First query for a filter scans every member once...
//! assert_eq!(members.match_any(&[2]), vec![0, 2, 4, 6, 8]);
//! // ...repeating it reuses the cached bitmap.
//! assert_eq!(members.match_any(&[2]), vec![0, 2, 4, 6, 8]);
//!
//! members.remove(&4);
//! assert_eq!(members.match_any(&[2]), vec![0, 2, 6, 8]);
//! ```
//!
//! The filter cache should be sized to match or exceed the expected filter
//! cardinality; an evicted filter pays a full re-scan on its next query.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod config;
pub mod error;

mod cache;
mod engine;
mod index;
mod sync;

// Re-exports
pub use cache::CacheStats;
pub use config::{Options, DEFAULT_FILTER_CACHE_CAPACITY};
pub use engine::SkipFilter;
pub use error::{Error, Result};
pub use sync::ConcurrentSkipFilter;
