//! Benchmark comparing lock strategies:
//! - BlockingLock, QueueLock vs parking_lot::Mutex
//!
//! Run with: cargo bench --package handover-core --bench lock_benchmark

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use handover_core::{BlockingLock, QueueLock, RawLock, RawLockExt};
use mimalloc::MiMalloc;
use parking_lot::Mutex;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const OPS_PER_THREAD: usize = 10_000;

// =============================================================================
// Generic helpers
// =============================================================================

/// Uncontended acquire/release pairs on a single thread.
fn bench_uncontended<L: RawLock>(ops: usize) -> usize {
    let lock = L::default();
    let counter = AtomicUsize::new(0);
    for _ in 0..ops {
        lock.with_lock(|| {
            let value = counter.load(Ordering::Relaxed);
            counter.store(value + 1, Ordering::Relaxed);
        });
    }
    counter.load(Ordering::Relaxed)
}

/// All threads hammer one lock with a tiny critical section.
fn bench_contended<L: RawLock + 'static>(thread_count: usize, ops_per_thread: usize) -> usize {
    let lock = Arc::new(L::default());
    let counter = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..ops_per_thread {
                    let _guard = lock.lock();
                    let value = counter.load(Ordering::Relaxed);
                    counter.store(value + 1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    counter.load(Ordering::Relaxed)
}

fn bench_mutex_contended(thread_count: usize, ops_per_thread: usize) -> usize {
    let counter = Arc::new(Mutex::new(0usize));

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..ops_per_thread {
                    *counter.lock() += 1;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    *counter.lock()
}

// =============================================================================
// Criterion benchmark groups
// =============================================================================

fn uncontended_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock_uncontended");

    group.bench_function("blocking_lock", |b| {
        b.iter(|| bench_uncontended::<BlockingLock>(black_box(OPS_PER_THREAD)))
    });

    group.bench_function("queue_lock", |b| {
        b.iter(|| bench_uncontended::<QueueLock>(black_box(OPS_PER_THREAD)))
    });

    group.finish();
}

fn contended_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock_contended");

    for threads in [2, 4, 8, 16] {
        group.bench_with_input(
            BenchmarkId::new("blocking_lock", threads),
            &threads,
            |b, &threads| {
                b.iter(|| bench_contended::<BlockingLock>(black_box(threads), OPS_PER_THREAD))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("queue_lock", threads),
            &threads,
            |b, &threads| {
                b.iter(|| bench_contended::<QueueLock>(black_box(threads), OPS_PER_THREAD))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("parking_lot_mutex", threads),
            &threads,
            |b, &threads| b.iter(|| bench_mutex_contended(black_box(threads), OPS_PER_THREAD)),
        );
    }

    group.finish();
}

criterion_group!(benches, uncontended_benchmark, contended_benchmark);
criterion_main!(benches);
