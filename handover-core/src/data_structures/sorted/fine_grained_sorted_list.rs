use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::debug;

use crate::data_structures::sorted::locked_node::{ListNode, LockedNode};
use crate::preemptive_synchronization::{BlockingLock, QueueLock, RawLock};

/// Sorted list guarded by parking mutexes.
pub type BlockingSortedList<T> = FineGrainedSortedList<T, BlockingLock>;

/// Sorted list guarded by MCS queue locks.
pub type QueueSortedList<T> = FineGrainedSortedList<T, QueueLock>;

///
/// Concurrent sorted multiset with one lock per node and hand-over-hand
/// (lock coupling) traversal.
///
// =============================================================================
// LIST STRUCTURE
// =============================================================================
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  3   │───►│  3   │───►│  5   │───► null
// │(sent)│    │ lock │    │ lock │    │ lock │
// └──────┘    └──────┘    └──────┘    └──────┘
//
// INVARIANTS:
// 1. Values are non-decreasing along the chain; equal values are contiguous.
// 2. A node's `next` is read or written only while holding that node's lock.
// 3. No operation holds more than two node locks.
// 4. A node is freed only after its predecessor's `next` has been rewritten
//    while holding both the predecessor and the node itself.
// 5. HEAD is a sentinel: never counted, never removed.
//
// =============================================================================
// TRAVERSAL (lock coupling)
// =============================================================================
//
// Step 0:  [HEAD] ──► [3]         hold {HEAD, 3}
//
// Step 1:  release HEAD           hold {3}
//          lock 3.next            hold {3, 3'}
//
// Step 2:  release 3              hold {3'}
//          lock 3'.next           hold {3', 5}
//
// A node can only be locked by a thread that holds its predecessor, so a
// thread holding {pred, curr} excludes every other thread from curr: anyone
// who reached curr earlier has already moved past it.
//
// =============================================================================
// REMOVE
// =============================================================================
//
// Before:  pred ──► curr ──► next        hold {pred, curr}
//
// Unlink:  pred ────────────► next       pred.next = curr.next
//                   curr ──► next
//
// Release pred, release curr, free curr.
//
// =============================================================================
//
pub struct FineGrainedSortedList<T, L: RawLock> {
    head: Box<ListNode<T, L>>,
    _owns: PhantomData<Box<ListNode<T, L>>>,
}

// SAFETY: nodes are owned by the list and every shared access to a `next`
// link happens under that node's lock. Values are shared across threads by
// reference (`&T`) and moved in and out by value.
unsafe impl<T: Send, L: RawLock> Send for FineGrainedSortedList<T, L> {}
unsafe impl<T: Send + Sync, L: RawLock> Sync for FineGrainedSortedList<T, L> {}

impl<T, L: RawLock> FineGrainedSortedList<T, L> {
    pub fn new() -> Self {
        FineGrainedSortedList {
            head: Box::new(ListNode::new_sentinel()),
            _owns: PhantomData,
        }
    }

    /// Name of the lock strategy guarding the nodes.
    pub fn strategy(&self) -> &'static str {
        L::NAME
    }

    fn lock_head(&self) -> LockedNode<'_, T, L> {
        // SAFETY: the sentinel lives as long as the list.
        unsafe { LockedNode::acquire(NonNull::from(&*self.head)) }
    }

    /// Returns `true` if the list holds no elements.
    ///
    pub fn is_empty(&self) -> bool {
        self.lock_head().next().is_null()
    }

    /// Removes and returns the smallest element.
    ///
    pub fn pop_first(&self) -> Option<T> {
        let head = self.lock_head();
        let first = head.lock_next()?;

        head.set_next(first.next());
        drop(head);

        // SAFETY: `first` was unlinked while holding head and itself.
        unsafe { first.reclaim() }
    }

    /// Number of elements. Walks the whole list with lock coupling.
    ///
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut current = self.lock_head();
        while let Some(next) = current.lock_next() {
            count += 1;
            current = next;
        }
        count
    }
}

impl<T: Ord, L: RawLock> FineGrainedSortedList<T, L> {
    /// Walks to the first node whose value is not less than `value`.
    ///
    /// Returns the locked predecessor and the locked candidate (`None` at the
    /// end of the chain). Exactly these two locks are held on return.
    ///
    fn locate(&self, value: &T) -> (LockedNode<'_, T, L>, Option<LockedNode<'_, T, L>>) {
        let mut pred = self.lock_head();
        let mut current = pred.lock_next();

        while let Some(candidate) = current.take() {
            if candidate.value().is_some_and(|v| v >= value) {
                current = Some(candidate);
                break;
            }

            // Releases the old predecessor; only `candidate` is held now.
            pred = candidate;
            current = pred.lock_next();
        }

        (pred, current)
    }

    /// Inserts `value`, keeping the chain sorted. Duplicates are kept.
    ///
    pub fn insert(&self, value: T) {
        let (pred, current) = self.locate(&value);

        let successor = current.as_ref().map_or(std::ptr::null_mut(), |c| c.as_ptr());
        let node = Box::into_raw(Box::new(ListNode::new(value, successor)));

        pred.set_next(node);
        drop(current);
        drop(pred);
    }

    /// Removes one occurrence of `value`.
    ///
    /// Returns `false` without modifying the list if `value` is absent.
    ///
    pub fn remove(&self, value: &T) -> bool {
        let (pred, current) = self.locate(value);

        let Some(current) = current else {
            return false;
        };
        if current.value() != Some(value) {
            return false;
        }

        pred.set_next(current.next());
        drop(pred);

        // SAFETY: `current` was unlinked while holding pred and itself.
        unsafe { current.reclaim() };
        true
    }

    /// Number of occurrences of `value`.
    ///
    pub fn count(&self, value: &T) -> usize {
        let (pred, mut current) = self.locate(value);
        drop(pred);

        let mut count = 0;
        while let Some(node) = current.take() {
            if node.value() != Some(value) {
                break;
            }
            count += 1;
            // Lock the successor before `node` is released at the end of the body.
            current = node.lock_next();
        }
        count
    }

    /// Returns `true` if at least one occurrence of `value` is present.
    ///
    pub fn contains(&self, value: &T) -> bool {
        let (_pred, current) = self.locate(value);
        current.is_some_and(|node| node.value() == Some(value))
    }
}

impl<T: Clone, L: RawLock> FineGrainedSortedList<T, L> {
    /// Collects all elements in chain order.
    ///
    pub fn to_vec(&self) -> Vec<T> {
        let mut result = Vec::new();
        let mut current = self.lock_head();
        while let Some(next) = current.lock_next() {
            if let Some(value) = next.value() {
                result.push(value.clone());
            }
            current = next;
        }
        result
    }
}

impl<T, L: RawLock> FineGrainedSortedList<T, L> {
    /// Consumes the list and returns its elements in chain order.
    ///
    pub fn into_vec(mut self) -> Vec<T> {
        let mut result = Vec::new();
        let mut current = self.head.next_mut();
        self.head = Box::new(ListNode::new_sentinel());

        while let Some(node) = NonNull::new(current) {
            // SAFETY: `&mut self`-style exclusive ownership; every node came
            // from Box::into_raw and is visited once.
            let mut node = unsafe { Box::from_raw(node.as_ptr()) };
            current = node.next_mut();
            result.extend(node.into_value());
        }
        result
    }
}

impl<T, L: RawLock> Default for FineGrainedSortedList<T, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, L: RawLock> Drop for FineGrainedSortedList<T, L> {
    fn drop(&mut self) {
        let mut freed = 0usize;
        let mut current = self.head.next_mut();

        // Iterative to keep long chains off the stack.
        while let Some(node) = NonNull::new(current) {
            // SAFETY: exclusive access; every node came from Box::into_raw.
            let mut node = unsafe { Box::from_raw(node.as_ptr()) };
            current = node.next_mut();
            freed += 1;
        }

        if freed > 0 {
            debug!(freed, strategy = L::NAME, "fine_grained_sorted_list: dropped");
        }
    }
}

impl<T: Ord, L: RawLock> FromIterator<T> for FineGrainedSortedList<T, L> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let list = Self::new();
        for value in iter {
            list.insert(value);
        }
        list
    }
}

impl<T: Ord, L: RawLock> Extend<T> for FineGrainedSortedList<T, L> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Clone + fmt::Debug, L: RawLock> fmt::Debug for FineGrainedSortedList<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FineGrainedSortedList")
            .field("strategy", &self.strategy())
            .field("values", &self.to_vec())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_into_empty_list_links_head() {
        // The sentinel head makes the first insert an ordinary link, so the
        // element is reachable right away.
        let list = QueueSortedList::new();
        assert!(list.is_empty());

        list.insert(42);
        assert!(!list.is_empty());
        assert_eq!(list.to_vec(), vec![42]);
        assert_eq!(list.count(&42), 1);
    }

    #[test]
    fn test_insert_smaller_than_first_becomes_first() {
        let list = BlockingSortedList::new();
        list.insert(10);
        list.insert(1);

        assert_eq!(list.to_vec(), vec![1, 10]);
        assert_eq!(list.pop_first(), Some(1));
    }

    #[test]
    fn test_pop_first_drains_in_order() {
        let list: QueueSortedList<i32> = [4, 1, 3, 1].into_iter().collect();

        let mut drained = vec![];
        while let Some(value) = list.pop_first() {
            drained.push(value);
        }

        assert_eq!(drained, vec![1, 1, 3, 4]);
        assert!(list.is_empty());
        assert_eq!(list.pop_first(), None);
    }

    #[test]
    fn test_into_vec_consumes_in_order() {
        let mut list = BlockingSortedList::new();
        list.extend(["pear", "apple", "fig", "apple"]);

        assert_eq!(list.len(), 4);
        assert_eq!(list.into_vec(), vec!["apple", "apple", "fig", "pear"]);
    }

    #[test]
    fn test_drop_long_chain_is_iterative() {
        let list = QueueSortedList::new();
        for i in (0..100_000).rev() {
            list.insert(i);
        }
        assert_eq!(list.len(), 100_000);
        drop(list);
    }

    #[test]
    fn test_strategy_names_the_lock() {
        assert_eq!(QueueSortedList::<i32>::new().strategy(), "queue");
        assert_eq!(BlockingSortedList::<i32>::new().strategy(), "blocking");
    }

    #[test]
    fn test_debug_shows_strategy_and_values() {
        let list: BlockingSortedList<u8> = [2, 1].into_iter().collect();
        let text = format!("{list:?}");

        assert!(text.contains("blocking"));
        assert!(text.contains("[1, 2]"));
    }
}
