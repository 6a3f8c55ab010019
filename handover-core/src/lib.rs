pub mod common_tests;
pub mod data_structures;
pub mod preemptive_synchronization;

// Re-export the main types for convenience
pub use data_structures::{BlockingSortedList, FineGrainedSortedList, QueueSortedList};
pub use preemptive_synchronization::{BlockingLock, QueueLock, RawLock, RawLockExt};

/*
Task list:

Locks:

- [x] Blocking lock on parking_lot
- [x] MCS queue lock with per-thread waiter registry
- [ ] CLH variant for comparison in lock_benchmark

Sorted list:

- [x] insert / remove / count with lock coupling
- [x] pop_first for draining
- [ ] Optimistic (lazy) variant: validate instead of coupling on read paths

Benchmark:

- [ ] https://github.com/bheisler/iai

*/
