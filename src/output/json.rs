//! JSON statistics for scripting.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "mode": "real",
//!   "files": 1204,
//!   "linked": 37,
//!   "compared": 41,
//!   "saved": 12897484,
//!   "saved_human": "12.3 MiB",
//!   "duration_secs": 0.84,
//!   "errors": 0,
//!   "critical": 0,
//!   "backups_retained": 0,
//!   "interrupted": false,
//!   "exit_code": 0,
//!   "exit_code_name": "HL000"
//! }
//! ```

use std::io::Write;

use bytesize::ByteSize;
use serde::Serialize;
use thiserror::Error;

use super::RunSummary;
use crate::error::ExitCode;

/// Error type for JSON output.
#[derive(Debug, Error)]
pub enum JsonOutputError {
    /// Serialization failed.
    #[error("JSON serialization failed")]
    Serialize(#[from] serde_json::Error),
    /// Writing failed.
    #[error("failed to write JSON output")]
    Io(#[from] std::io::Error),
}

/// JSON view of a [`RunSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// `"real"` or `"dry-run"`
    pub mode: &'static str,
    /// Regular files that passed the filters
    pub files: usize,
    /// Files replaced by a link
    pub linked: usize,
    /// Content comparisons performed
    pub compared: usize,
    /// Bytes freed
    pub saved: u64,
    /// Bytes freed, IEC units
    pub saved_human: String,
    /// Wall-clock seconds
    pub duration_secs: f64,
    /// Scan, compare and link failures
    pub errors: usize,
    /// Failures that left data at a backup path
    pub critical: usize,
    /// Backup files that could not be removed
    pub backups_retained: usize,
    /// Whether the run stopped early
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "HL000")
    pub exit_code_name: String,
}

impl JsonOutput {
    /// Build the JSON view.
    #[must_use]
    pub fn new(summary: &RunSummary, exit_code: ExitCode) -> Self {
        Self {
            mode: summary.mode(),
            files: summary.files,
            linked: summary.link.linked,
            compared: summary.link.compared,
            saved: summary.link.saved,
            saved_human: ByteSize::b(summary.link.saved).to_string(),
            duration_secs: summary.duration.as_secs_f64(),
            errors: summary.errors(),
            critical: summary.link.critical,
            backups_retained: summary.link.backups_retained,
            interrupted: summary.link.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        let json = self.to_json_pretty()?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}
