//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the hardlink tool.
///
/// - 0: Success (per-file failures do not change this)
/// - 1: General error (bad pattern, unusable configuration)
/// - 2: Usage error (emitted by clap before [`crate::run_app`] runs)
/// - 130: Interrupted by Ctrl+C or SIGTERM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// The run completed.
    Success = 0,
    /// A fatal error stopped the run before or during setup.
    GeneralError = 1,
    /// Command-line usage error.
    Usage = 2,
    /// The run was interrupted by a signal.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "HL000",
            Self::GeneralError => "HL001",
            Self::Usage => "HL002",
            Self::Interrupted => "HL130",
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "HL001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
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
