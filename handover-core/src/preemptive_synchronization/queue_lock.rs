//! MCS queue lock.
//!
//! Contenders form an explicit FIFO chain of waiter records. Each waiter
//! spins only on the `locked` flag of its own record, so a handoff touches one
//! foreign cache line no matter how many threads are queued.
//!
//! # Acquire
//!
//! ```text
//!   claim record R (locked = true, successor = null)
//!         │
//!         ▼
//!   pred = tail.swap(R)
//!         │
//!    ┌────┴─────┐
//!    │          │
//!    ▼          ▼
//!   null      pred
//!    │          │
//!    ▼          ▼
//!   owned    pred.successor = R
//!   (fast     spin on R.locked
//!    path)    until cleared
//! ```
//!
//! # Release
//!
//! ```text
//!   succ = R.successor
//!         │
//!    ┌────┴───────────────────────┐
//!    │ null                       │ known
//!    ▼                            ▼
//!   CAS tail R ─► null       succ.locked = false
//!    │         │               (handoff)
//!   ok       failed
//!    │         │
//!    ▼         ▼
//!   free     successor is mid-enqueue:
//!            wait for R.successor, then handoff
//! ```
//!
//! Grant order equals the order of the `tail.swap` calls.

use std::fmt;
use std::ptr;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use crossbeam::utils::{Backoff, CachePadded};

use crate::preemptive_synchronization::raw_lock::RawLock;
use crate::preemptive_synchronization::waiter_registry::{Waiter, WaiterPtr, WaiterRegistry};

/// How an acquisition obtained the lock.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// The queue was empty; the lock was owned right after the tail exchange.
    Uncontended,
    /// The thread enqueued behind a predecessor and waited for the handoff.
    Queued,
}

/// Fair FIFO spin lock with per-waiter local spinning.
///
pub struct QueueLock {
    tail: AtomicPtr<CachePadded<Waiter>>,
    contended: AtomicUsize,
}

impl QueueLock {
    pub const fn new() -> Self {
        QueueLock {
            tail: AtomicPtr::new(ptr::null_mut()),
            contended: AtomicUsize::new(0),
        }
    }

    /// Acquires the lock and reports whether the thread had to queue.
    ///
    pub fn acquire_queued(&self) -> Acquisition {
        WaiterRegistry::with_local(|waiters| {
            let record = waiters.claim(self.identity());

            // SAFETY: records stay allocated while their thread is registered.
            let me = unsafe { record.as_ref() };
            me.locked.store(true, Ordering::Relaxed);
            me.successor.store(ptr::null_mut(), Ordering::Relaxed);

            let predecessor = self.tail.swap(record.as_ptr(), Ordering::AcqRel);
            let Some(predecessor) = NonNull::new(predecessor) else {
                return Acquisition::Uncontended;
            };

            self.contended.fetch_add(1, Ordering::Relaxed);

            // SAFETY: the predecessor cannot finish its release (and unclaim
            // its record) before it has observed this store.
            unsafe { predecessor.as_ref() }
                .successor
                .store(record.as_ptr(), Ordering::Release);

            let backoff = Backoff::new();
            while me.locked.load(Ordering::Acquire) {
                backoff.snooze();
            }

            Acquisition::Queued
        })
    }

    /// Number of acquisitions that had to enqueue behind a predecessor.
    ///
    /// Updated right after the tail exchange, only on the contended path.
    ///
    pub fn contended_acquisitions(&self) -> usize {
        self.contended.load(Ordering::Relaxed)
    }

    #[inline]
    fn identity(&self) -> *const () {
        ptr::from_ref(self).cast()
    }

    /// Clears the successor's flag, handing the lock over.
    ///
    /// # Safety
    ///
    /// `successor` must be a queued record published into our own record.
    ///
    #[inline]
    unsafe fn hand_off(successor: WaiterPtr) {
        // SAFETY: the successor spins on its record until this store lands.
        unsafe { &*successor }.locked.store(false, Ordering::Release);
    }
}

impl Default for QueueLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for QueueLock {
    const NAME: &'static str = "queue";

    fn acquire(&self) {
        _ = self.acquire_queued();
    }

    fn try_acquire(&self) -> bool {
        WaiterRegistry::with_local(|waiters| {
            let record = waiters.claim(self.identity());

            // SAFETY: records stay allocated while their thread is registered.
            let me = unsafe { record.as_ref() };
            me.locked.store(false, Ordering::Relaxed);
            me.successor.store(ptr::null_mut(), Ordering::Relaxed);

            match self.tail.compare_exchange(
                ptr::null_mut(),
                record.as_ptr(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => true,
                Err(_) => {
                    waiters.unclaim(record);
                    false
                }
            }
        })
    }

    unsafe fn release(&self) {
        WaiterRegistry::with_local(|waiters| {
            let Some(record) = waiters.claimed_for(self.identity()) else {
                debug_assert!(false, "queue lock released by a thread that does not hold it");
                return;
            };

            // SAFETY: records stay allocated while their thread is registered.
            let me = unsafe { record.as_ref() };

            let mut successor = me.successor.load(Ordering::Acquire);
            if successor.is_null() {
                // Nobody visible behind us. If the tail is still ours, the
                // queue is empty and the lock becomes free.
                //
                if self
                    .tail
                    .compare_exchange(
                        record.as_ptr(),
                        ptr::null_mut(),
                        Ordering::Release,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    waiters.unclaim(record);
                    return;
                }

                // A successor swapped the tail but has not linked itself yet.
                //
                let backoff = Backoff::new();
                loop {
                    successor = me.successor.load(Ordering::Acquire);
                    if !successor.is_null() {
                        break;
                    }
                    backoff.snooze();
                }
            }

            waiters.unclaim(record);

            // SAFETY: `successor` was published into our record by its owner.
            unsafe { Self::hand_off(successor) };
        })
    }

    fn is_locked(&self) -> bool {
        !self.tail.load(Ordering::Relaxed).is_null()
    }
}

impl fmt::Debug for QueueLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueLock")
            .field("locked", &self.is_locked())
            .field("contended_acquisitions", &self.contended_acquisitions())
            .finish()
    }
}
