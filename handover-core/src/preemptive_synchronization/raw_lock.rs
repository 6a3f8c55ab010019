//! Lock strategy abstraction shared by the blocking and queue locks.
//!
//! # Ownership Model
//!
//! A `RawLock` carries no data. It guards whatever the caller decides it
//! guards (for the sorted list: one node's `next` link). Acquisition and
//! release are split so that a holder can keep the lock across a traversal
//! step and hand it off in any order:
//!
//! ```text
//!   acquire(A) ── acquire(B) ── release(A) ── acquire(C) ── release(B) ...
//!      │             │             │
//!      ▼             ▼             ▼
//!   hold {A}     hold {A,B}     hold {B}
//! ```
//!
//! # Scoped Release
//!
//! `release` is `unsafe`: releasing a lock the caller does not hold breaks
//! mutual exclusion for somebody else. Safe code goes through [`LockGuard`],
//! which releases on drop along every exit path.

use std::fmt;
use std::marker::PhantomData;

/// A mutual-exclusion strategy with split acquire/release.
///
/// Implementations are non-reentrant: a thread that already holds the lock
/// and calls `acquire` again deadlocks.
///
pub trait RawLock: Default + Send + Sync {
    /// Human readable strategy name.
    const NAME: &'static str;

    /// Blocks (or spins) until the calling thread owns the lock.
    fn acquire(&self);

    /// Attempts to take the lock without waiting.
    ///
    /// Returns `true` if the calling thread now owns the lock.
    ///
    fn try_acquire(&self) -> bool;

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The calling thread must own the lock through a matching `acquire`
    /// (or successful `try_acquire`) that has not been released yet, and the
    /// lock must not have moved since then.
    ///
    unsafe fn release(&self);

    /// Returns `true` if some thread currently owns the lock.
    ///
    /// The answer may be stale by the time the caller looks at it.
    ///
    fn is_locked(&self) -> bool;
}

/// Scoped helpers available on every [`RawLock`].
///
pub trait RawLockExt: RawLock {
    /// Acquires the lock and returns a guard that releases it on drop.
    ///
    #[must_use]
    fn lock(&self) -> LockGuard<'_, Self> {
        self.acquire();
        LockGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Attempts to acquire the lock without waiting.
    ///
    #[must_use]
    fn try_lock(&self) -> Option<LockGuard<'_, Self>> {
        match self.try_acquire() {
            true => Some(LockGuard {
                lock: self,
                _not_send: PhantomData,
            }),
            false => None,
        }
    }

    /// Runs `f` while holding the lock.
    ///
    fn with_lock<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.lock();
        f()
    }
}

// Blanket implementation: every RawLock gets the scoped helpers.
//
impl<L: RawLock> RawLockExt for L {}

/// Proof that the current thread holds `lock`. Releases it on drop.
///
/// The guard is `!Send`: the queue lock finds the waiter record to release
/// through the releasing thread, so release must happen where acquire did.
///
#[must_use = "dropping the guard releases the lock immediately"]
pub struct LockGuard<'a, L: RawLock> {
    lock: &'a L,
    _not_send: PhantomData<*const ()>,
}

impl<L: RawLock> LockGuard<'_, L> {
    /// The lock this guard holds.
    pub fn raw(&self) -> &L {
        self.lock
    }
}

impl<L: RawLock> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        // SAFETY: a guard only exists after a successful acquire by this thread.
        unsafe { self.lock.release() };
    }
}

impl<L: RawLock> fmt::Debug for LockGuard<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").field("strategy", &L::NAME).finish()
    }
}
