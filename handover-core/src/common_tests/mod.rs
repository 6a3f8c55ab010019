//! Reusable test suites, generic over the lock strategy.
//!
//! Integration tests in `tests/` instantiate every suite once per strategy.


use std::fmt::Debug;

/// Asserts that `values` is in non-decreasing order.
pub fn assert_sorted<T: Ord + Debug>(values: &[T]) {
    if let Some(window) = values.windows(2).find(|pair| pair[0] > pair[1]) {
        panic!("order invariant violated: {:?} before {:?}", window[0], window[1]);
    }
}
