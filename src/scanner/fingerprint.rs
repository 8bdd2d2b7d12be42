//! Metadata fingerprints used to partition files into link candidates.
//!
//! # Overview
//!
//! Two files can only ever be hardlinked if they live on the same device and
//! have the same size. On top of that, the user may require matching mode
//! bits, owner, basename and modification time. Every optional attribute is
//! an [`Attr`]: either the concrete value or [`Attr::Ignored`].
//!
//! Files are grouped by [`Fingerprint`] before any content is read, so a
//! byte comparison only ever happens between files that already agree on
//! every attribute the configuration cares about.
//!
//! # Example
//!
//! ```
//! use hardlink::scanner::{Attr, FingerprintConfig};
//!
//! let config = FingerprintConfig::default().content_only();
//! assert!(!config.respect_mode);
//! assert_eq!(Attr::<u32>::Ignored, Attr::Ignored);
//! assert_ne!(Attr::Value(0o644), Attr::Ignored);
//! ```

use std::ffi::OsString;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// A fingerprint attribute that may be excluded from grouping.
///
/// Two `Ignored` markers compare equal to each other and unequal to any
/// concrete value, so the derived `Eq` and `Hash` are exactly what the
/// bucket map needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr<T> {
    /// The attribute does not take part in grouping.
    Ignored,
    /// The attribute must match exactly.
    Value(T),
}

impl<T> Attr<T> {
    /// Build an attribute that is only kept when `respect` is set.
    pub fn when(respect: bool, value: impl FnOnce() -> T) -> Self {
        if respect {
            Self::Value(value())
        } else {
            Self::Ignored
        }
    }

    /// Whether this attribute is ignored.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }
}

/// Which attributes must match for two files to be link candidates.
///
/// Device and size are not listed here: they always take part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Require identical mode bits (permissions and file type).
    pub respect_mode: bool,
    /// Require identical owner uid and gid.
    pub respect_owner: bool,
    /// Require identical basenames.
    pub respect_name: bool,
    /// Require identical modification times.
    pub respect_time: bool,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            respect_mode: true,
            respect_owner: true,
            respect_name: false,
            respect_time: true,
        }
    }
}

impl FingerprintConfig {
    /// Compare contents only: mode, owner, name and time are all ignored.
    #[must_use]
    pub fn content_only(self) -> Self {
        Self {
            respect_mode: false,
            respect_owner: false,
            respect_name: false,
            respect_time: false,
        }
    }
}

/// Grouping key for link candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// File mode bits (`st_mode`)
    pub mode: Attr<u32>,
    /// Device the file lives on (`st_dev`)
    pub device: u64,
    /// Owner user id
    pub uid: Attr<u32>,
    /// Owner group id
    pub gid: Attr<u32>,
    /// Final path component
    pub name: Attr<OsString>,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub mtime: Attr<SystemTime>,
}

impl Fingerprint {
    /// Compute the fingerprint of `path` from its (already fetched) metadata.
    #[must_use]
    pub fn from_metadata(path: &Path, metadata: &Metadata, config: &FingerprintConfig) -> Self {
        Self {
            mode: Attr::when(config.respect_mode, || metadata.mode()),
            device: metadata.dev(),
            uid: Attr::when(config.respect_owner, || metadata.uid()),
            gid: Attr::when(config.respect_owner, || metadata.gid()),
            name: Attr::when(config.respect_name, || {
                path.file_name().map(|n| n.to_os_string()).unwrap_or_default()
            }),
            size: metadata.len(),
            mtime: Attr::when(config.respect_time, || modified_time(metadata)),
        }
    }
}

/// Modification time of a file, falling back to the epoch when unavailable.
pub(crate) fn modified_time(metadata: &Metadata) -> SystemTime {
    metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH)
}
