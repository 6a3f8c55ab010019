use std::fmt;
use std::str::FromStr;

use crate::error::HarnessError;

pub const USAGE: &str =
    "Usage: handover-harness <threads> <operations> [--lock queue|blocking] [--key-range N] [--seed N]";

/// Lock strategy guarding the list nodes.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Queue,
    Blocking,
}

impl FromStr for LockKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queue" => Ok(LockKind::Queue),
            "blocking" => Ok(LockKind::Blocking),
            other => Err(HarnessError::UnknownLock(other.to_string())),
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKind::Queue => f.write_str("queue"),
            LockKind::Blocking => f.write_str("blocking"),
        }
    }
}

/// Run configuration parsed from the command line.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub threads: usize,
    /// Operations per thread.
    pub operations: usize,
    pub lock: LockKind,
    /// Keys are drawn from `0..key_range`.
    pub key_range: u32,
    pub seed: u64,
}

impl HarnessConfig {
    pub const MAX_THREADS: usize = 4096;
    pub const DEFAULT_KEY_RANGE: u32 = 64;
    pub const DEFAULT_SEED: u64 = 0x5eed;

    pub fn new(threads: usize, operations: usize) -> Self {
        HarnessConfig {
            threads,
            operations,
            lock: LockKind::Queue,
            key_range: Self::DEFAULT_KEY_RANGE,
            seed: Self::DEFAULT_SEED,
        }
    }
}

/// What the command line asked for.
///
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Run(HarnessConfig),
}

/// Parses arguments (without the program name).
///
pub fn parse_args<I, S>(args: I) -> Result<Command, HarnessError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        return Ok(Command::Help);
    }

    let mut positional = vec![];
    let mut lock = LockKind::Queue;
    let mut key_range = HarnessConfig::DEFAULT_KEY_RANGE;
    let mut seed = HarnessConfig::DEFAULT_SEED;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--lock" => {
                lock = iter.next().ok_or(HarnessError::MissingArgument("lock"))?.parse()?;
            }
            "--key-range" => {
                let value = iter.next().ok_or(HarnessError::MissingArgument("key-range"))?;
                key_range = parse_positive("key-range", &value)?;
            }
            "--seed" => {
                let value = iter.next().ok_or(HarnessError::MissingArgument("seed"))?;
                seed = value.parse().map_err(|_| HarnessError::InvalidCount {
                    name: "seed",
                    value: value.clone(),
                })?;
            }
            flag if flag.starts_with("--") => {
                return Err(HarnessError::UnknownFlag(flag.to_string()));
            }
            other => positional.push(other.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    let threads = positional.next().ok_or(HarnessError::MissingArgument("threads"))?;
    let operations = positional.next().ok_or(HarnessError::MissingArgument("operations"))?;
    if let Some(extra) = positional.next() {
        return Err(HarnessError::UnknownFlag(extra));
    }

    let thread_count: usize = parse_positive("threads", &threads)?;
    if thread_count > HarnessConfig::MAX_THREADS {
        return Err(HarnessError::InvalidCount {
            name: "threads",
            value: threads,
        });
    }

    Ok(Command::Run(HarnessConfig {
        threads: thread_count,
        operations: parse_positive("operations", &operations)?,
        lock,
        key_range,
        seed,
    }))
}

fn parse_positive<N>(name: &'static str, value: &str) -> Result<N, HarnessError>
where
    N: FromStr + Default + PartialOrd,
{
    match value.parse::<N>() {
        Ok(n) if n > N::default() => Ok(n),
        _ => Err(HarnessError::InvalidCount {
            name,
            value: value.to_string(),
        }),
    }
}
