use std::fmt;

use lock_api::RawMutex as _;
use parking_lot::RawMutex;

use crate::preemptive_synchronization::raw_lock::RawLock;

/// Blocking lock backed by a parking mutex.
///
/// Contending threads are parked by the OS until the holder releases. Any
/// parked waiter may be granted next; there is no bound on overtaking.
///
pub struct BlockingLock {
    raw: RawMutex,
}

impl BlockingLock {
    pub const fn new() -> Self {
        BlockingLock {
            raw: RawMutex::INIT,
        }
    }
}

impl Default for BlockingLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for BlockingLock {
    const NAME: &'static str = "blocking";

    #[inline]
    fn acquire(&self) {
        self.raw.lock();
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.raw.try_lock()
    }

    #[inline]
    unsafe fn release(&self) {
        // SAFETY: forwarded from the caller, who holds the lock.
        unsafe { self.raw.unlock() };
    }

    #[inline]
    fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}

impl fmt::Debug for BlockingLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preemptive_synchronization::raw_lock::RawLockExt;

    #[test]
    fn test_try_acquire_fails_while_held() {
        let lock = BlockingLock::new();

        let guard = lock.lock();
        assert!(lock.is_locked());
        assert!(lock.try_lock().is_none());

        drop(guard);
        assert!(!lock.is_locked());
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn test_split_acquire_release() {
        let lock = BlockingLock::default();

        lock.acquire();
        assert!(lock.is_locked());
        unsafe { lock.release() };
        assert!(!lock.is_locked());
    }
}
