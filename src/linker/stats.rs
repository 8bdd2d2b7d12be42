//! Per-bucket link reports.
//!
//! Every bucket reduction returns its own [`LinkStats`]; the caller folds
//! them together with [`LinkStats::merge`]. Nothing is accumulated through
//! shared state.

use serde::Serialize;

/// Counters produced by reducing one or more buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Buckets with at least two records that were reduced
    pub buckets: usize,
    /// Content comparisons performed
    pub compared: usize,
    /// Files replaced by a link (or that would be, in a dry run)
    pub linked: usize,
    /// Bytes freed by linking
    pub saved: u64,
    /// Ordinary failures: compare errors and recoverable link errors
    pub failed: usize,
    /// Link failures that left data only at a backup path
    pub critical: usize,
    /// Links whose backup file could not be removed
    pub backups_retained: usize,
    /// Whether shutdown cut the reduction short
    pub interrupted: bool,
}

impl LinkStats {
    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: &LinkStats) {
        self.buckets += other.buckets;
        self.compared += other.compared;
        self.linked += other.linked;
        self.saved += other.saved;
        self.failed += other.failed;
        self.critical += other.critical;
        self.backups_retained += other.backups_retained;
        self.interrupted |= other.interrupted;
    }

    /// Total failures of any severity.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.failed + self.critical
    }
}
