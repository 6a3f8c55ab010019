//! Sorted collections built on per-node locks.
//!
//! Collections are parameterized by a lock strategy `L: RawLock`:
//!
//! - `BlockingLock`: parking mutex, no fairness
//! - `QueueLock`: MCS queue lock, FIFO handoff

pub mod fine_grained_sorted_list;
mod locked_node;

pub use fine_grained_sorted_list::{BlockingSortedList, FineGrainedSortedList, QueueSortedList};
