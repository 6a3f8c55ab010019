use handover_core::common_tests::sorted_list_stress_tests::*;
use handover_core::{BlockingLock, QueueLock, RawLock};
use rstest::rstest;
use serial_test::serial;

// Trait for type-level parametrization
trait TestLockStrategy {
    type Lock: RawLock + 'static;
}

// Marker types for each lock strategy
struct UseBlockingLock;
struct UseQueueLock;

impl TestLockStrategy for UseBlockingLock {
    type Lock = BlockingLock;
}

impl TestLockStrategy for UseQueueLock {
    type Lock = QueueLock;
}

#[rstest]
#[serial(stress_tests)]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn stress_no_lost_updates<T: TestLockStrategy>(#[case] _type: T) {
    test_no_lost_updates::<T::Lock>();
}

#[rstest]
#[serial(stress_tests)]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn stress_concurrent_remove_same_value<T: TestLockStrategy>(#[case] _type: T) {
    test_concurrent_remove_same_value::<T::Lock>();
}

#[rstest]
#[serial(stress_tests)]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn stress_linearizability<T: TestLockStrategy>(#[case] _type: T) {
    test_linearizability::<T::Lock>();
}

#[rstest]
#[serial(stress_tests)]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn stress_order_under_concurrent_inserts<T: TestLockStrategy>(#[case] _type: T) {
    test_order_under_concurrent_inserts::<T::Lock>();
}

#[rstest]
#[serial(stress_tests)]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn stress_remove_absent_does_not_block<T: TestLockStrategy>(#[case] _type: T) {
    test_remove_absent_does_not_block::<T::Lock>();
}

#[rstest]
#[serial(stress_tests)]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn stress_count_during_modifications<T: TestLockStrategy>(#[case] _type: T) {
    test_count_during_modifications::<T::Lock>();
}

#[rstest]
#[serial(stress_tests)]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn stress_progress_under_contention<T: TestLockStrategy>(#[case] _type: T) {
    test_progress_under_contention::<T::Lock>();
}
