//! Error types for the cycle pipeline.

use remind_core::RemindError;
use remind_github::GithubError;

/// Errors that abort a poll cycle.
///
/// None of these are fatal to the process: the outer loop logs the failure
/// and schedules the next cycle regardless.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("Cycle lock is held elsewhere")]
    LockHeld,
    #[error("Lock error: {0}")]
    Lock(String),
    #[error("GitHub error: {0}")]
    Github(#[from] GithubError),
}

impl From<CycleError> for RemindError {
    fn from(err: CycleError) -> Self {
        match err {
            CycleError::LockHeld | CycleError::Lock(_) => RemindError::Lock(err.to_string()),
            CycleError::Github(e) => e.into(),
        }
    }
}
