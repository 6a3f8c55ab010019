use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::preemptive_synchronization::RawLock;

pub(super) type NodePtr<T, L> = *mut ListNode<T, L>;

/// A node of the fine-grained sorted list.
///
/// `value` is `None` only for the head sentinel. `next` is guarded by this
/// node's own `lock` and is only reachable through a [`LockedNode`].
///
pub(super) struct ListNode<T, L> {
    value: Option<T>,
    lock: L,
    next: AtomicPtr<ListNode<T, L>>,
}

impl<T, L: RawLock> ListNode<T, L> {
    pub(super) fn new(value: T, next: NodePtr<T, L>) -> Self {
        ListNode {
            value: Some(value),
            lock: L::default(),
            next: AtomicPtr::new(next),
        }
    }

    pub(super) fn new_sentinel() -> Self {
        ListNode {
            value: None,
            lock: L::default(),
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Takes the value out of a node the caller exclusively owns.
    pub(super) fn into_value(self) -> Option<T> {
        self.value
    }

    /// Next pointer of a node the caller has exclusive (`&mut`) access to.
    pub(super) fn next_mut(&mut self) -> NodePtr<T, L> {
        *self.next.get_mut()
    }
}

impl<T: fmt::Debug, L> fmt::Debug for ListNode<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListNode")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// Proof that the current thread holds a node's lock.
///
/// The successor link can only be read or written through this handle, so
/// every access to `next` happens under the node's lock. Dropping the handle
/// releases the lock.
///
/// ```text
///   LockedNode(pred) ──next()──► ListNode(curr) ──lock_next()──► LockedNode(curr)
/// ```
///
pub(super) struct LockedNode<'a, T, L: RawLock> {
    node: NonNull<ListNode<T, L>>,
    _list: PhantomData<&'a ListNode<T, L>>,
    // Locks must be released by the thread that acquired them.
    _not_send: PhantomData<*const ()>,
}

impl<'a, T, L: RawLock> LockedNode<'a, T, L> {
    /// Acquires `node`'s lock.
    ///
    /// # Safety
    ///
    /// `node` must be the head sentinel, or must have been read from the
    /// `next` link of a node whose lock the caller still holds.
    ///
    pub(super) unsafe fn acquire(node: NonNull<ListNode<T, L>>) -> Self {
        // SAFETY: forwarded from the caller; the node cannot be freed while
        // its predecessor is held.
        unsafe { node.as_ref() }.lock.acquire();
        LockedNode {
            node,
            _list: PhantomData,
            _not_send: PhantomData,
        }
    }

    #[inline]
    fn node(&self) -> &ListNode<T, L> {
        // SAFETY: a held node cannot be unlinked and freed by anybody else.
        unsafe { self.node.as_ref() }
    }

    /// The node's value, `None` for the head sentinel.
    #[inline]
    pub(super) fn value(&self) -> Option<&T> {
        self.node().value.as_ref()
    }

    #[inline]
    pub(super) fn as_ptr(&self) -> NodePtr<T, L> {
        self.node.as_ptr()
    }

    /// Successor link.
    #[inline]
    pub(super) fn next(&self) -> NodePtr<T, L> {
        self.node().next.load(Ordering::Acquire)
    }

    /// Repoints the successor link.
    #[inline]
    pub(super) fn set_next(&self, next: NodePtr<T, L>) {
        self.node().next.store(next, Ordering::Release)
    }

    /// Locks the successor while this node is still held.
    ///
    pub(super) fn lock_next(&self) -> Option<LockedNode<'a, T, L>> {
        let next = NonNull::new(self.next())?;
        // SAFETY: `next` was read from this node's link while holding its lock.
        Some(unsafe { LockedNode::acquire(next) })
    }

    /// Releases the lock of an unlinked node and frees it.
    ///
    /// # Safety
    ///
    /// The node must have been allocated by `Box::new`, must no longer be
    /// reachable from the list, and its predecessor link must have been
    /// rewritten while both locks were held.
    ///
    pub(super) unsafe fn reclaim(self) -> Option<T> {
        let node = self.node;
        // Release first: the lock lives inside the allocation.
        drop(self);
        // SAFETY: unreachable, unlocked, allocated by Box::new (caller contract).
        let node = unsafe { Box::from_raw(node.as_ptr()) };
        node.into_value()
    }
}

impl<T, L: RawLock> Drop for LockedNode<'_, T, L> {
    fn drop(&mut self) {
        // SAFETY: the handle exists only after `acquire` on this thread.
        unsafe { self.node().lock.release() };
    }
}
