//! Data structures for concurrent collections.
//!
//! # Organization
//!
//! - [`sorted`] - Sorted multisets with hand-over-hand per-node locking

pub mod sorted;

pub use sorted::{BlockingSortedList, FineGrainedSortedList, QueueSortedList};
