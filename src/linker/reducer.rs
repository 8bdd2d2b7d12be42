//! Divide-and-conquer reduction of fingerprint buckets.
//!
//! # Overview
//!
//! Each bucket is reduced independently:
//!
//! 1. Pick a master from the pending records according to [`LinkPolicy`].
//! 2. Walk the remaining records against the master:
//!    - same inode as the master: already resolved, dropped;
//!    - identical content: replaced by a link to the master, dropped;
//!    - anything else: kept as undetermined.
//! 3. The undetermined records become the next round's pending set.
//!
//! Rounds stop once fewer than two records remain. Files hardlinked to a
//! common inode are therefore never compared against each other.
//!
//! # Concurrency
//!
//! Buckets are distributed over a rayon pool. A path belongs to exactly one
//! bucket, so no two workers ever touch the same file, and each bucket
//! returns its own [`LinkStats`] for the caller to merge.
//!
//! # Known limitation
//!
//! Inode identity is captured at scan time and not refreshed after a link,
//! so [`FileRecord::is_linked_to`] only reflects the state before the run.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::compare::contents_equal;
use super::link::{link_file, LinkBackend, LinkOutcome, StdFs};
use super::stats::LinkStats;
use crate::progress::ProgressCallback;
use crate::scanner::{Buckets, FileRecord, LinkLedger};

/// Which record of a round is kept as the link source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
    /// No link-count preference; the first record in scan order wins ties.
    #[default]
    First,
    /// Keep the record with the most links.
    Maximize,
    /// Keep the record with the fewest links.
    Minimize,
}

impl LinkPolicy {
    /// Compare two candidates by link count alone.
    fn rank(self, a: &FileRecord, b: &FileRecord) -> CmpOrdering {
        match self {
            Self::First => CmpOrdering::Equal,
            Self::Maximize => a.link_count.cmp(&b.link_count),
            Self::Minimize => b.link_count.cmp(&a.link_count),
        }
    }
}

/// Error type for reductions that cannot start.
#[derive(Debug, Error)]
pub enum ReduceError {
    /// The worker pool could not be created.
    #[error("cannot start {threads} worker threads")]
    ThreadPool {
        /// Requested thread count
        threads: usize,
        /// The underlying rayon error
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

/// Configuration for bucket reduction.
#[derive(Clone)]
pub struct ReducerConfig {
    /// Master selection policy.
    pub policy: LinkPolicy,
    /// Report links without touching the filesystem.
    pub dry_run: bool,
    /// Worker threads for bucket reduction (1 = sequential).
    pub threads: usize,
    /// Filesystem used for link operations.
    pub backend: Arc<dyn LinkBackend>,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ReducerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReducerConfig")
            .field("policy", &self.policy)
            .field("dry_run", &self.dry_run)
            .field("threads", &self.threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish_non_exhaustive()
    }
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            policy: LinkPolicy::First,
            dry_run: false,
            threads: 1,
            backend: Arc::new(StdFs),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl ReducerConfig {
    /// Set the master selection policy.
    #[must_use]
    pub fn with_policy(mut self, policy: LinkPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the number of worker threads.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Replace the filesystem backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn LinkBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Index of the record that should act as master.
///
/// Order: `policy`, then newer modification time, then earliest position.
/// Returns `None` for an empty slice.
#[must_use]
pub fn select_master(records: &[FileRecord], policy: LinkPolicy) -> Option<usize> {
    let mut best = 0;
    for (i, candidate) in records.iter().enumerate().skip(1) {
        let current = &records[best];
        let order = policy
            .rank(candidate, current)
            .then_with(|| candidate.modified.cmp(&current.modified));
        if order == CmpOrdering::Greater {
            best = i;
        }
    }
    (!records.is_empty()).then_some(best)
}

/// Reduce a single bucket and report what happened.
///
/// Buckets with fewer than two records or of size zero are returned
/// untouched with empty statistics.
pub fn reduce_bucket(records: Vec<FileRecord>, config: &ReducerConfig) -> LinkStats {
    let mut stats = LinkStats::default();
    if records.len() < 2 || records[0].size() == 0 {
        return stats;
    }
    stats.buckets = 1;

    // Overlapping roots can report one path twice; keep its first record.
    let mut seen = HashSet::with_capacity(records.len());
    let mut pending: Vec<FileRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.path.clone()))
        .collect();

    let mut ledger = LinkLedger::new();
    for record in &pending {
        ledger.observe(record.inode, record.link_count);
    }

    while pending.len() >= 2 {
        if config.is_shutdown_requested() {
            stats.interrupted = true;
            break;
        }

        let Some(index) = select_master(&pending, config.policy) else {
            break;
        };
        let mut master = pending.remove(index);
        let mut undetermined = Vec::with_capacity(pending.len());

        for mut other in pending {
            if config.is_shutdown_requested() {
                stats.interrupted = true;
                break;
            }
            if master.is_linked_to(&other) || master.path == other.path {
                continue;
            }

            log::debug!(
                "Comparing {} to {}",
                master.path.display(),
                other.path.display()
            );
            stats.compared += 1;
            match contents_equal(&master.path, &other.path) {
                Ok(true) => {}
                Ok(false) => {
                    undetermined.push(other);
                    continue;
                }
                Err(e) => {
                    log::warn!("{}", e);
                    stats.failed += 1;
                    undetermined.push(other);
                    continue;
                }
            }

            link_pair(&mut master, &mut other, &mut ledger, &mut stats, config);
        }

        pending = undetermined;
    }

    stats
}

fn link_pair(
    master: &mut FileRecord,
    other: &mut FileRecord,
    ledger: &mut LinkLedger,
    stats: &mut LinkStats,
    config: &ReducerConfig,
) {
    match link_file(
        &master.path,
        &other.path,
        config.dry_run,
        config.backend.as_ref(),
    ) {
        Ok(outcome) => {
            let size = master.size();
            log::info!(
                "{}Linking {} to {} (-{})",
                if config.dry_run { "[DryRun] " } else { "" },
                master.path.display(),
                other.path.display(),
                ByteSize::b(size)
            );
            if let LinkOutcome::BackupRetained(_) = outcome {
                stats.backups_retained += 1;
            }

            stats.linked += 1;
            ledger.gain(master.inode);
            if ledger.release(other.inode) {
                stats.saved += size;
            }
            master.link_count += 1;
            other.link_count = master.link_count;
        }
        Err(e) if e.is_critical() => {
            log::error!("{}", e);
            stats.critical += 1;
        }
        Err(e) => {
            log::warn!("{}", e);
            stats.failed += 1;
        }
    }
}

/// Reduce every bucket and merge the per-bucket reports.
///
/// Buckets are processed in order of their first path so logs and progress
/// are stable between runs.
///
/// # Errors
///
/// Returns [`ReduceError::ThreadPool`] if the worker pool cannot be built.
pub fn reduce(buckets: Buckets, config: &ReducerConfig) -> Result<LinkStats, ReduceError> {
    let mut work: Vec<Vec<FileRecord>> = buckets
        .into_values()
        .filter(|records| records.len() >= 2 && records[0].size() > 0)
        .collect();
    work.sort_by(|a, b| a[0].path.cmp(&b[0].path));

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("linking", work.len());
    }
    log::info!(
        "Reducing {} candidate buckets on {} thread(s)",
        work.len(),
        config.threads
    );

    let done = AtomicUsize::new(0);
    let run_one = |records: Vec<FileRecord>| {
        let label = records[0].path.display().to_string();
        let stats = reduce_bucket(records, config);
        let current = done.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(ref callback) = config.progress_callback {
            callback.on_progress(current, &label);
        }
        stats
    };

    let merge = |mut total: LinkStats, part: LinkStats| {
        total.merge(&part);
        total
    };

    let mut stats = if config.threads <= 1 {
        work.into_iter()
            .map(run_one)
            .fold(LinkStats::default(), merge)
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|source| ReduceError::ThreadPool {
                threads: config.threads,
                source,
            })?;
        pool.install(|| {
            work.into_par_iter()
                .map(run_one)
                .reduce(LinkStats::default, merge)
        })
    };

    if config.is_shutdown_requested() {
        stats.interrupted = true;
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("linking");
    }

    Ok(stats)
}
