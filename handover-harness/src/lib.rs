//! Timed stress driver for the hand-over-hand sorted list.

pub mod config;
pub mod error;
pub mod workload;

pub use config::{Command, HarnessConfig, LockKind, USAGE, parse_args};
pub use error::HarnessError;
pub use workload::RunReport;

use handover_core::{BlockingLock, QueueLock};
use tracing::info;

/// Runs the workload with the configured lock strategy.
///
pub fn run(config: &HarnessConfig) -> Result<RunReport, HarnessError> {
    info!(
        threads = config.threads,
        operations = config.operations,
        lock = %config.lock,
        key_range = config.key_range,
        seed = config.seed,
        "harness: starting run"
    );

    let report = match config.lock {
        LockKind::Queue => workload::run::<QueueLock>(config)?,
        LockKind::Blocking => workload::run::<BlockingLock>(config)?,
    };

    info!(
        elapsed = ?report.elapsed,
        inserts = report.inserts,
        removes = report.removes,
        counts = report.counts,
        remaining = report.remaining,
        "harness: verified"
    );
    Ok(report)
}
