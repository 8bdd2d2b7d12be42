//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one or more
//! root directories, filtering paths, stat'ing every regular file and
//! grouping the results by [`Fingerprint`](super::Fingerprint).
//!
//! # Features
//!
//! - Parallel directory reading using the rayon thread pool behind jwalk
//! - Deterministic order (children are sorted by name)
//! - Hidden files are scanned; symbolic links are never followed
//! - Type determination by `lstat`: a symlink is never a regular file
//! - Per-file errors are logged and collected, never fatal
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use hardlink::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from("/srv/mirror")], WalkerConfig::default());
//! let output = walker.scan();
//! println!("{} files in {} buckets", output.stats.files, output.buckets.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{Buckets, FileRecord, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Statistics collected while scanning.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Regular files that passed the filters and were stat'ed
    pub files: usize,
    /// Per-file errors (the files were skipped)
    pub errors: Vec<ScanError>,
    /// Whether the walk was cut short by a shutdown request
    pub interrupted: bool,
}

/// Result of a complete scan.
#[derive(Debug, Default)]
pub struct ScanOutput {
    /// Files grouped by fingerprint, each bucket in scan order
    pub buckets: Buckets,
    /// Counters and collected errors
    pub stats: ScanStats,
}

impl ScanOutput {
    /// Number of buckets holding at least two records.
    #[must_use]
    pub fn candidate_buckets(&self) -> usize {
        self.buckets.values().filter(|b| b.len() > 1).count()
    }
}

/// Multi-root directory walker.
pub struct Walker {
    /// Roots to walk, in the order given
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("roots", &self.roots)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given roots.
    ///
    /// Roots may be directories (or symlinks to them) or regular files.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self {
            roots,
            config,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
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

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk every root, yielding one record per regular file that passes
    /// the filters.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        self.roots
            .iter()
            .flat_map(move |root| self.walk_root(root))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
    }

    fn walk_root<'a>(
        &'a self,
        root: &'a Path,
    ) -> Box<dyn Iterator<Item = Result<FileRecord, ScanError>> + 'a> {
        // Roots are resolved through symlinks; entries below them are not.
        match std::fs::metadata(root) {
            Err(e) => {
                let err = ScanError::from_io(root, e);
                log::warn!("{}", err);
                return Box::new(std::iter::once(Err(err)));
            }
            Ok(metadata) if metadata.is_dir() => {}
            Ok(metadata) if metadata.is_file() && !root.is_symlink() => {
                return Box::new(self.process_path(root.to_path_buf()).into_iter());
            }
            Ok(_) => {
                let err = ScanError::UnsupportedRoot(root.to_path_buf());
                log::warn!("{}", err);
                return Box::new(std::iter::once(Err(err)));
            }
        }

        // A trailing separator makes the walk start inside a symlinked root.
        let start = if root.is_symlink() {
            root.join("")
        } else {
            root.to_path_buf()
        };

        let walk_dir = WalkDir::new(start)
            .follow_links(false)
            .skip_hidden(false)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        Box::new(
            walk_dir
                .into_iter()
                .filter_map(move |entry_result| match entry_result {
                    Ok(entry) => {
                        if entry.file_type().is_dir() {
                            return None;
                        }
                        self.process_path(entry.path())
                    }
                    Err(e) => {
                        let path = e
                            .path()
                            .map_or_else(|| root.to_path_buf(), std::borrow::ToOwned::to_owned);
                        log::warn!("Cannot read {}: {}", path.display(), e);
                        Some(Err(ScanError::Walk {
                            path,
                            message: e.to_string(),
                        }))
                    }
                }),
        )
    }

    /// Filter and stat a single non-directory path.
    fn process_path(&self, path: PathBuf) -> Option<Result<FileRecord, ScanError>> {
        if !self.config.filter.allows(&path) {
            log::trace!("Skipping filtered path: {}", path.display());
            return None;
        }

        match FileRecord::stat(&path, &self.config.fingerprint) {
            Ok((record, true)) => {
                log::trace!("Visiting {}", path.display());
                Some(Ok(record))
            }
            Ok((_, false)) => {
                log::trace!("Skipping non-regular file: {}", path.display());
                None
            }
            Err(e) => {
                match &e {
                    ScanError::NotFound(_) => {
                        log::debug!("File not found (may have been deleted): {}", path.display())
                    }
                    _ => log::warn!("{}", e),
                }
                Some(Err(e))
            }
        }
    }

    /// Walk every root and group the regular files by fingerprint.
    #[must_use]
    pub fn scan(&self) -> ScanOutput {
        let mut output = ScanOutput::default();

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("scanning", 0);
        }

        let mut seen = 0usize;
        for result in self.walk() {
            seen += 1;
            match result {
                Ok(record) => {
                    output.stats.files += 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback.on_progress(seen, record.path.to_string_lossy().as_ref());
                    }
                    output
                        .buckets
                        .entry(record.fingerprint.clone())
                        .or_default()
                        .push(record);
                }
                Err(e) => output.stats.errors.push(e),
            }
        }

        output.stats.interrupted = self.is_shutdown_requested();
        if output.stats.interrupted {
            log::info!("Scan: Interrupted by shutdown signal");
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("scanning");
        }

        log::debug!(
            "Scan complete: {} files, {} buckets, {} with link candidates, {} errors",
            output.stats.files,
            output.buckets.len(),
            output.candidate_buckets(),
            output.stats.errors.len()
        );

        output
    }
}
