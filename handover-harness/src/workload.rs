//! Mixed insert/remove/count workload and its verification.
//!
//! ```text
//!   thread 0 ──► [insert k | remove k | count k] x operations ──► ledger 0
//!   thread 1 ──► ...                                          ──► ledger 1
//!      ...
//!                  join ──► sum ledgers ──► drain list ──► compare
//! ```
//!
//! A ledger records, per key, successful inserts minus successful removes.
//! With no mutator in flight the drained multiset must equal the ledger sum.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use handover_core::{FineGrainedSortedList, RawLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error};

use crate::config::HarnessConfig;
use crate::error::HarnessError;

type Ledger = BTreeMap<u32, i64>;

/// Outcome of a verified run.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub elapsed: Duration,
    pub inserts: u64,
    pub removes: u64,
    pub counts: u64,
    /// Elements left in the list when the workers finished.
    pub remaining: usize,
}

#[derive(Default)]
struct ThreadResult {
    ledger: Ledger,
    inserts: u64,
    removes: u64,
    counts: u64,
}

/// Runs the workload against a list guarded by `L`, then drains and verifies.
///
pub fn run<L: RawLock + 'static>(config: &HarnessConfig) -> Result<RunReport, HarnessError> {
    let participants = config
        .threads
        .checked_add(1)
        .ok_or_else(|| HarnessError::InvalidCount {
            name: "threads",
            value: config.threads.to_string(),
        })?;

    let list = Arc::new(FineGrainedSortedList::<u32, L>::new());
    let barrier = Arc::new(Barrier::new(participants));
    debug!(strategy = list.strategy(), participants, "workload: spawning workers");

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            let seed = config.seed.wrapping_add(t as u64);
            let operations = config.operations;
            let key_range = config.key_range;
            thread::spawn(move || {
                barrier.wait();
                worker(&list, seed, operations, key_range)
            })
        })
        .collect();

    barrier.wait();
    let start = Instant::now();

    // Join every worker before looking at any outcome.
    let joined: Vec<_> = handles.into_iter().map(|handle| handle.join()).collect();
    let elapsed = start.elapsed();

    let panicked = joined.iter().filter(|outcome| outcome.is_err()).count();
    if panicked > 0 {
        error!(panicked, "workload: worker threads panicked");
        return Err(HarnessError::VerificationFailed(format!(
            "{panicked} worker thread(s) panicked"
        )));
    }

    let mut expected = Ledger::new();
    let (mut inserts, mut removes, mut counts) = (0, 0, 0);
    for result in joined.into_iter().flatten() {
        for (key, delta) in result.ledger {
            *expected.entry(key).or_default() += delta;
        }
        inserts += result.inserts;
        removes += result.removes;
        counts += result.counts;
    }

    debug!(?elapsed, "workload: workers joined, draining");
    let remaining = verify(&list, expected)?;

    Ok(RunReport {
        elapsed,
        inserts,
        removes,
        counts,
        remaining,
    })
}

fn worker<L: RawLock>(
    list: &FineGrainedSortedList<u32, L>,
    seed: u64,
    operations: usize,
    key_range: u32,
) -> ThreadResult {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut result = ThreadResult::default();

    for _ in 0..operations {
        let key = rng.random_range(0..key_range);
        match rng.random_range(0..3) {
            0 => {
                list.insert(key);
                *result.ledger.entry(key).or_default() += 1;
                result.inserts += 1;
            }
            1 => {
                if list.remove(&key) {
                    *result.ledger.entry(key).or_default() -= 1;
                    result.removes += 1;
                }
            }
            _ => {
                _ = list.count(&key);
                result.counts += 1;
            }
        }
    }

    result
}

/// Drains `list` and compares it against the summed ledgers.
///
/// Returns the number of drained elements.
///
fn verify<L: RawLock>(
    list: &FineGrainedSortedList<u32, L>,
    mut expected: Ledger,
) -> Result<usize, HarnessError> {
    let mut drained = Ledger::new();
    let mut previous = None;
    let mut total = 0;

    while let Some(value) = list.pop_first() {
        if previous > Some(value) {
            error!(?previous, value, "workload: drain out of order");
            return Err(HarnessError::VerificationFailed(format!(
                "drained {value} after {previous:?}"
            )));
        }
        previous = Some(value);
        *drained.entry(value).or_default() += 1;
        total += 1;
    }

    expected.retain(|_, delta| *delta != 0);
    if drained != expected {
        let mismatched: BTreeSet<_> = expected
            .keys()
            .chain(drained.keys())
            .filter(|key| expected.get(key) != drained.get(key))
            .collect();
        error!(?mismatched, "workload: drained multiset differs from ledgers");
        return Err(HarnessError::VerificationFailed(format!(
            "{} key(s) mismatched, first {:?}",
            mismatched.len(),
            mismatched.first()
        )));
    }

    Ok(total)
}
