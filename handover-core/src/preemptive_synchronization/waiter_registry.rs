//! Per-thread registry of queue lock waiter records.
//!
//! Every thread that touches a [`QueueLock`](super::queue_lock::QueueLock)
//! registers once and receives a [`ThreadWaiters`] pool. The pool hands out
//! one [`Waiter`] per queue lock the thread currently holds or waits on, so a
//! thread coupling two list nodes uses two records. Records are allocated
//! lazily, reused for the lifetime of the thread, and freed when the thread's
//! registration is dropped at thread exit.
//!
//! ```text
//!   WaiterRegistry
//!   ┌─────────────────────────────────────────────┐
//!   │ ThreadId(3) ─► ThreadWaiters: [W0]─►[W1]    │
//!   │ ThreadId(7) ─► ThreadWaiters: [W0]          │
//!   └─────────────────────────────────────────────┘
//!              W0.claimed_by = &lock_a  (queued / holding)
//!              W1.claimed_by = null     (free for reuse)
//! ```
//!
//! # Record Lifetime
//!
//! Other threads only touch a record while it is enqueued on some lock:
//! a predecessor publishes itself into `successor`, and the releasing holder
//! clears `locked`. Both happen before the owning thread leaves the
//! corresponding `release`, so a record that is unclaimed has no foreign
//! readers and can be reused or freed.

use std::collections::HashMap;
use std::ptr;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering};
use std::thread::{self, ThreadId};

use crossbeam::utils::CachePadded;
use parking_lot::Mutex;
use tracing::{debug, warn};

/// One MCS queue entry.
///
/// Each record sits on its own cache line so spinning on `locked` stays local.
///
pub(crate) struct Waiter {
    /// Set while waiting for the predecessor to hand the lock over.
    pub(crate) locked: AtomicBool,
    /// The next waiter in line, published by that waiter after it enqueues.
    pub(crate) successor: AtomicPtr<CachePadded<Waiter>>,
    /// Lock this record is enqueued on, or null when free. Owner thread only.
    claimed_by: AtomicPtr<()>,
    /// Intrusive link in the owning thread's pool. Written once on insertion.
    next_in_pool: AtomicPtr<CachePadded<Waiter>>,
}

impl Waiter {
    fn new() -> Self {
        Waiter {
            locked: AtomicBool::new(false),
            successor: AtomicPtr::new(ptr::null_mut()),
            claimed_by: AtomicPtr::new(ptr::null_mut()),
            next_in_pool: AtomicPtr::new(ptr::null_mut()),
        }
    }
}

pub(crate) type WaiterPtr = *mut CachePadded<Waiter>;

/// Pool of waiter records owned by a single thread.
///
pub struct ThreadWaiters {
    thread_id: ThreadId,
    first: AtomicPtr<CachePadded<Waiter>>,
    allocated: AtomicUsize,
}

impl ThreadWaiters {
    fn new(thread_id: ThreadId) -> Self {
        ThreadWaiters {
            thread_id,
            first: AtomicPtr::new(ptr::null_mut()),
            allocated: AtomicUsize::new(0),
        }
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Number of records this thread has allocated so far.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Claims a free record for `lock`, allocating one if every record is busy.
    ///
    /// Must only be called by the owning thread.
    ///
    pub(crate) fn claim(&self, lock: *const ()) -> NonNull<CachePadded<Waiter>> {
        let mut current = self.first.load(Ordering::Acquire);
        while let Some(record) = NonNull::new(current) {
            // SAFETY: pool records live until the pool is dropped.
            let waiter = unsafe { record.as_ref() };
            if waiter.claimed_by.load(Ordering::Relaxed).is_null() {
                waiter.claimed_by.store(lock.cast_mut(), Ordering::Relaxed);
                return record;
            }
            current = waiter.next_in_pool.load(Ordering::Acquire);
        }

        let waiter = CachePadded::new(Waiter::new());
        waiter.claimed_by.store(lock.cast_mut(), Ordering::Relaxed);
        waiter
            .next_in_pool
            .store(self.first.load(Ordering::Relaxed), Ordering::Relaxed);

        let record = Box::into_raw(Box::new(waiter));
        self.first.store(record, Ordering::Release);
        self.allocated.fetch_add(1, Ordering::Relaxed);

        // SAFETY: just allocated by Box::into_raw.
        unsafe { NonNull::new_unchecked(record) }
    }

    /// Finds the record the owning thread has enqueued on `lock`.
    ///
    pub(crate) fn claimed_for(&self, lock: *const ()) -> Option<NonNull<CachePadded<Waiter>>> {
        let mut current = self.first.load(Ordering::Acquire);
        while let Some(record) = NonNull::new(current) {
            // SAFETY: pool records live until the pool is dropped.
            let waiter = unsafe { record.as_ref() };
            if ptr::eq(waiter.claimed_by.load(Ordering::Relaxed), lock) {
                return Some(record);
            }
            current = waiter.next_in_pool.load(Ordering::Acquire);
        }
        None
    }

    /// Returns a record to the pool.
    ///
    pub(crate) fn unclaim(&self, record: NonNull<CachePadded<Waiter>>) {
        // SAFETY: pool records live until the pool is dropped.
        let waiter = unsafe { record.as_ref() };
        waiter.claimed_by.store(ptr::null_mut(), Ordering::Relaxed);
    }

    /// Number of records currently enqueued on some lock.
    pub fn claimed(&self) -> usize {
        let mut count = 0;
        let mut current = self.first.load(Ordering::Acquire);
        while let Some(record) = NonNull::new(current) {
            // SAFETY: pool records live until the pool is dropped.
            let waiter = unsafe { record.as_ref() };
            if !waiter.claimed_by.load(Ordering::Relaxed).is_null() {
                count += 1;
            }
            current = waiter.next_in_pool.load(Ordering::Acquire);
        }
        count
    }
}

impl Drop for ThreadWaiters {
    fn drop(&mut self) {
        let mut current = *self.first.get_mut();
        while !current.is_null() {
            // SAFETY: every record in the pool came from Box::into_raw and the
            // owning thread is gone, so nothing can still be enqueued.
            let waiter = unsafe { Box::from_raw(current) };
            current = waiter.next_in_pool.load(Ordering::Relaxed);
        }
    }
}

/// Registry of per-thread waiter pools keyed by thread identity.
///
pub struct WaiterRegistry {
    threads: Mutex<HashMap<ThreadId, Arc<ThreadWaiters>>>,
}

static GLOBAL_REGISTRY: LazyLock<WaiterRegistry> = LazyLock::new(WaiterRegistry::new);

// Registration of the current thread.
//
thread_local! {
    static LOCAL_REGISTRATION: Registration = WaiterRegistry::global().register();
}

impl WaiterRegistry {
    fn new() -> Self {
        WaiterRegistry {
            threads: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide registry used by every queue lock.
    pub fn global() -> &'static WaiterRegistry {
        &GLOBAL_REGISTRY
    }

    /// Runs `f` with the calling thread's pool, registering the thread first
    /// if needed.
    ///
    /// # Panics
    ///
    /// Panics if called while the thread's locals are being torn down.
    ///
    pub fn with_local<F, R>(f: F) -> R
    where
        F: FnOnce(&ThreadWaiters) -> R,
    {
        LOCAL_REGISTRATION.with(|registration| f(&registration.waiters))
    }

    /// Number of threads with a live registration.
    pub fn registered_threads(&self) -> usize {
        self.threads.lock().len()
    }

    /// Returns `true` if `thread_id` currently has a registration.
    pub fn is_registered(&self, thread_id: ThreadId) -> bool {
        self.threads.lock().contains_key(&thread_id)
    }

    /// Total waiter records allocated across all registered threads.
    pub fn allocated_records(&self) -> usize {
        self.threads
            .lock()
            .values()
            .map(|waiters| waiters.allocated())
            .sum()
    }

    fn register(&'static self) -> Registration {
        let thread_id = thread::current().id();
        let waiters = Arc::new(ThreadWaiters::new(thread_id));

        let registered = {
            let mut threads = self.threads.lock();
            threads.insert(thread_id, Arc::clone(&waiters));
            threads.len()
        };
        debug!(?thread_id, registered, "waiter_registry: thread registered");

        Registration {
            registry: self,
            waiters,
        }
    }

    fn deregister(&self, thread_id: ThreadId) -> Option<Arc<ThreadWaiters>> {
        self.threads.lock().remove(&thread_id)
    }
}

/// Thread-local handle of a registration. Dropping it deregisters the thread.
///
struct Registration {
    registry: &'static WaiterRegistry,
    waiters: Arc<ThreadWaiters>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let thread_id = self.waiters.thread_id();
        let records = self.waiters.allocated();
        let claimed = self.waiters.claimed();
        if claimed != 0 {
            // Foreign threads may still reach the queued records. Leak the pool.
            warn!(?thread_id, claimed, "waiter_registry: thread exited while queued on a lock");
            std::mem::forget(Arc::clone(&self.waiters));
        }

        self.registry.deregister(thread_id);
        debug!(?thread_id, records, "waiter_registry: thread deregistered");
    }
}
