//! Mutual-exclusion primitives for preemptive (OS) threads.
//!
//! - [`BlockingLock`] - parks contending threads, no fairness guarantee
//! - [`QueueLock`] - MCS queue lock, strict FIFO handoff, local spinning
//!
//! Both implement [`RawLock`] and are interchangeable wherever a lock
//! strategy is a type parameter.

pub mod blocking_lock;
pub mod queue_lock;
pub mod raw_lock;
pub mod waiter_registry;

pub use blocking_lock::BlockingLock;
pub use queue_lock::{Acquisition, QueueLock};
pub use raw_lock::{LockGuard, RawLock, RawLockExt};
pub use waiter_registry::{ThreadWaiters, WaiterRegistry};
