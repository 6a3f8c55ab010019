use thiserror::Error;

/// Errors reported by the harness. Each maps to a process exit code.
///
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("missing required argument <{0}>")]
    MissingArgument(&'static str),

    #[error("<{name}> must be a positive integer, got {value:?}")]
    InvalidCount { name: &'static str, value: String },

    #[error("unknown lock strategy {0:?} (expected queue or blocking)")]
    UnknownLock(String),

    #[error("unknown flag {0:?}")]
    UnknownFlag(String),

    #[error("verification failed: {0}")]
    VerificationFailed(String),
}

impl HarnessError {
    /// Exit status for this error: 1 for usage errors, 2 for a failed run.
    pub fn exit_code(&self) -> u8 {
        match self {
            HarnessError::VerificationFailed(_) => 2,
            _ => 1,
        }
    }
}
