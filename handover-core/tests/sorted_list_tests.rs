use handover_core::common_tests::sorted_list_core_tests::*;
use handover_core::{BlockingLock, QueueLock, RawLock};
use rstest::rstest;

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
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn basic_scenario<T: TestLockStrategy>(#[case] _type: T) {
    test_basic_scenario::<T::Lock>();
}

#[rstest]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn empty_list<T: TestLockStrategy>(#[case] _type: T) {
    test_empty_list::<T::Lock>();
}

#[rstest]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn insert_into_empty_list<T: TestLockStrategy>(#[case] _type: T) {
    test_insert_into_empty_list::<T::Lock>();
}

#[rstest]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn remove_absent_value<T: TestLockStrategy>(#[case] _type: T) {
    test_remove_absent_value::<T::Lock>();
}

#[rstest]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn duplicates<T: TestLockStrategy>(#[case] _type: T) {
    test_duplicates::<T::Lock>();
}

#[rstest]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn count_run_boundaries<T: TestLockStrategy>(#[case] _type: T) {
    test_count_run_boundaries::<T::Lock>();
}

#[rstest]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn boundaries<T: TestLockStrategy>(#[case] _type: T) {
    test_boundaries::<T::Lock>();
}

#[rstest]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn matches_model<T: TestLockStrategy>(#[case] _type: T) {
    test_matches_model::<T::Lock>();
}

#[rstest]
#[case::blocking(UseBlockingLock)]
#[case::queue(UseQueueLock)]
fn drain_in_order<T: TestLockStrategy>(#[case] _type: T) {
    test_drain_in_order::<T::Lock>();
}
