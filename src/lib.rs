//! # Ordena: Ordered Containers and Consistent Hashing
//!
//! This crate provides a family of ordered data structures built on dense
//! index-linked arenas, together with the Jenkins hash and a consistent-hash
//! ring for key-to-member placement.
//!
//! ## Key Features
//!
//! - **Ordered Map**: Red-black tree over an arena with per-subtree counts,
//!   pluggable comparators, and O(log n) positional queries
//! - **Live Range Views**: Detached sub-range windows of a map that track
//!   later mutations and gate writes to their bounds
//! - **Ordered Queue**: FIFO over a growable circular buffer with explicit
//!   capacity trimming
//! - **Skip List**: Probabilistic ordered map with O(1) access to both ends
//! - **Deque**: Index-linked arena deque, plus a coarse-lock wrapper for
//!   sharing one across threads
//! - **Consistent Hashing**: Jenkins lookup2 hashing and a thread-safe ring
//!   that maps hashes to responsible members
//! - **Fail-Fast Cursors**: Detached, version-stamped cursors on every
//!   container that report concurrent modification instead of misbehaving
//!
//! ## Quick Start
//!
//! ```rust
//! use ordena::{OrderedMap, OrderedQueue, SkipList};
//!
//! // Ordered dictionary with a live range view
//! let mut map = OrderedMap::new();
//! for key in [1, 3, 5, 7, 9] {
//!     map.insert(key, key * 10);
//! }
//! let view = map.range(3, true, 7, true).unwrap();
//! assert_eq!(view.len(&map), 3);
//! map.remove(&5);
//! assert_eq!(view.len(&map), 2);
//!
//! // FIFO queue over a circular buffer
//! let mut queue = OrderedQueue::new();
//! queue.enqueue("first");
//! queue.enqueue("second");
//! assert_eq!(queue.dequeue(), Ok("first"));
//!
//! // Skip list keeps keys sorted
//! let mut list = SkipList::new();
//! list.insert("b", 2);
//! list.insert("a", 1);
//! assert_eq!(list.first(), Some((&"a", &1)));
//!
//! // Jenkins hashing is deterministic across runs
//! assert_eq!(
//!     ordena::jenkins::hash_str("grain-17"),
//!     ordena::jenkins::hash_str("grain-17"),
//! );
//! ```

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod compare;
pub mod deque;
pub mod error;
pub mod hash_ring;
pub mod jenkins;
pub mod ordered_map;
pub mod ordered_queue;
pub mod rb_tree;
pub mod skip_list;

// Re-export core types
pub use compare::{Comparator, FnComparator, NaturalOrder, ReverseOrder};
pub use error::{OrdenaError, Result};

pub use deque::{Deque, DequeCursor, SynchronizedDeque};
pub use hash_ring::{HashRing, RingMember};
pub use ordered_map::{MapCursor, OrderedMap, RangeView};
pub use ordered_queue::{OrderedQueue, QueueCursor};
pub use rb_tree::{DuplicatePolicy, InsertOutcome, RangePosition, RbTree};
pub use skip_list::{SkipList, SkipListCursor};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library (currently only logs the version)
pub fn init() {
    log::debug!("Initializing ordena v{}", VERSION);
}
