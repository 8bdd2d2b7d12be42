//! Scanner module for directory traversal and fingerprinting.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Include/exclude filtering with regular expressions
//! - Metadata fingerprints that partition files into link candidates
//! - Inode identity for files that are already hardlinked
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and bucketing
//! - [`filter`]: Include/exclude decision rule
//! - [`fingerprint`]: Grouping keys with ignorable attributes
//! - [`hardlink`]: (device, inode) identity and link bookkeeping
//!
//! # Example
//!
//! ```no_run
//! use hardlink::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from(".")], WalkerConfig::default());
//! let output = walker.scan();
//! for (fingerprint, records) in &output.buckets {
//!     if records.len() > 1 {
//!         println!("{} candidates of {} bytes", records.len(), fingerprint.size);
//!     }
//! }
//! ```

pub mod filter;
pub mod fingerprint;
pub mod hardlink;
pub mod walker;

use std::collections::HashMap;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use filter::{PathFilter, PatternError};
pub use fingerprint::{Attr, Fingerprint, FingerprintConfig};
pub use hardlink::{InodeKey, LinkLedger};
pub use walker::{ScanOutput, ScanStats, Walker};

/// Files sharing a fingerprint, in scan order.
pub type Buckets = HashMap<Fingerprint, Vec<FileRecord>>;

/// One regular file discovered during the walk.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Path as discovered (relative roots give relative paths)
    pub path: PathBuf,
    /// Grouping key
    pub fingerprint: Fingerprint,
    /// Hardlink count at scan time, bumped in memory after each link
    pub link_count: u64,
    /// Identity captured at scan time
    pub inode: InodeKey,
    /// Modification time, kept even when the fingerprint ignores it
    pub modified: SystemTime,
}

impl FileRecord {
    /// Build a record from a path and its `lstat` metadata.
    #[must_use]
    pub fn from_metadata(path: PathBuf, metadata: &Metadata, config: &FingerprintConfig) -> Self {
        let fingerprint = Fingerprint::from_metadata(&path, metadata, config);
        Self {
            path,
            fingerprint,
            link_count: metadata.nlink(),
            inode: InodeKey::from_metadata(metadata),
            modified: fingerprint::modified_time(metadata),
        }
    }

    /// Stat `path` without following symlinks and build a record.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if the path cannot be stat'ed.
    pub fn stat(path: &Path, config: &FingerprintConfig) -> Result<(Self, bool), ScanError> {
        let metadata = std::fs::symlink_metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        let is_regular = metadata.file_type().is_file();
        Ok((Self::from_metadata(path.to_path_buf(), &metadata, config), is_regular))
    }

    /// File size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.fingerprint.size
    }

    /// Whether both records were the same inode when they were scanned.
    ///
    /// The identity is never refreshed after this process links files, so
    /// the answer reflects scan time only.
    #[must_use]
    pub fn is_linked_to(&self, other: &FileRecord) -> bool {
        self.inode == other.inode
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Which attributes take part in the fingerprint.
    pub fingerprint: FingerprintConfig,

    /// Include/exclude patterns applied to full paths.
    pub filter: PathFilter,
}

impl WalkerConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(fingerprint: FingerprintConfig, filter: PathFilter) -> Self {
        Self {
            fingerprint,
            filter,
        }
    }

    /// Replace the fingerprint configuration.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: FingerprintConfig) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Replace the path filter.
    #[must_use]
    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A root is neither a directory nor a regular file.
    #[error("Not a directory or regular file: {0}")]
    UnsupportedRoot(PathBuf),

    /// The directory walker could not read an entry.
    #[error("Cannot read {path}: {message}")]
    Walk {
        /// Path where the error occurred
        path: PathBuf,
        /// Walker error description
        message: String,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The path this error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::UnsupportedRoot(p) => p,
            Self::Io { path, .. } | Self::Walk { path, .. } => path,
        }
    }
}
