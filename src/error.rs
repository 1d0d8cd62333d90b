//! Exit codes and structured error output for the binary.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: success
/// - 1: unexpected failure
/// - 2: the task completed but found nothing (no matches, no duplicates)
/// - 3: partial success (some items of a batch failed)
/// - 130: interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed and produced results.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Completed with nothing found.
    NothingFound = 2,
    /// Completed, but some items failed.
    PartialSuccess = 3,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric process exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code, e.g. `"PV002"`.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "PV000",
            Self::GeneralError => "PV001",
            Self::NothingFound => "PV002",
            Self::PartialSuccess => "PV003",
            Self::Interrupted => "PV130",
        }
    }

    /// Code for a batch that ran to the end with `failures` failed items.
    #[must_use]
    pub fn for_batch(succeeded: usize, failures: usize) -> Self {
        match (succeeded, failures) {
            (_, 0) => Self::Success,
            (0, _) => Self::GeneralError,
            _ => Self::PartialSuccess,
        }
    }
}

/// Error report printed by `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Machine-readable code, e.g. `"PV001"`.
    pub code: String,
    /// Numeric exit code.
    pub exit_code: i32,
    /// Error message including its causes.
    pub message: String,
    /// Whether the run was interrupted.
    pub interrupted: bool,
}

impl StructuredError {
    /// Build a report from an error and the exit code it maps to.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
