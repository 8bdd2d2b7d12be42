//! End-of-run statistics.
//!
//! - [`text`]: the classic aligned layout
//! - [`json`]: the same numbers as a JSON object
//!
//! # Example
//!
//! ```no_run
//! use hardlink::linker::{reduce, ReducerConfig};
//! use hardlink::output::{text::TextOutput, RunSummary};
//! use hardlink::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//! use std::time::Instant;
//!
//! let started = Instant::now();
//! let scan = Walker::new(vec![PathBuf::from(".")], WalkerConfig::default()).scan();
//! let files = scan.stats.files;
//! let stats = reduce(scan.buckets, &ReducerConfig::default()).unwrap();
//!
//! let summary = RunSummary::new(false, files, 0, stats, started.elapsed());
//! TextOutput::new(&summary).write_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod json;
pub mod text;

use std::time::Duration;

pub use json::JsonOutput;
pub use text::TextOutput;

use crate::linker::LinkStats;

/// Everything reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Regular files that passed the filters
    pub files: usize,
    /// Per-file scan failures
    pub scan_errors: usize,
    /// Merged reducer statistics
    pub link: LinkStats,
    /// Wall-clock time of scan and reduction
    pub duration: Duration,
}

impl RunSummary {
    /// Create a summary.
    #[must_use]
    pub fn new(
        dry_run: bool,
        files: usize,
        scan_errors: usize,
        link: LinkStats,
        duration: Duration,
    ) -> Self {
        Self {
            dry_run,
            files,
            scan_errors,
            link,
            duration,
        }
    }

    /// `"dry-run"` or `"real"`.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        if self.dry_run {
            "dry-run"
        } else {
            "real"
        }
    }

    /// Scan, compare and link failures together.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.scan_errors + self.link.errors()
    }
}
