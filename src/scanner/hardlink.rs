//! Inode identity for detecting files that are already hardlinked.
//!
//! # Overview
//!
//! Hardlinks are multiple directory entries pointing to the same inode on disk.
//! Two records with the same (device, inode) pair are already one file, so
//! comparing or linking them would be wasted work.
//!
//! [`InodeKey`] is captured once at scan time and never refreshed; see
//! [`crate::scanner::FileRecord::is_linked_to`].
//!
//! [`LinkLedger`] tracks how many names each inode of a bucket still has, so
//! the reducer knows when relinking a name actually frees an inode's data.
//!
//! # Example
//!
//! ```no_run
//! use hardlink::scanner::InodeKey;
//!
//! let a = std::fs::symlink_metadata("file.txt").unwrap();
//! let b = std::fs::symlink_metadata("hardlink_to_file.txt").unwrap();
//! if InodeKey::from_metadata(&a) == InodeKey::from_metadata(&b) {
//!     println!("already linked");
//! }
//! ```

use std::collections::HashMap;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;

/// (device_id, inode) pair identifying one on-disk file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InodeKey {
    /// Device id (`st_dev`)
    pub dev: u64,
    /// Inode number (`st_ino`)
    pub ino: u64,
}

impl InodeKey {
    /// Create a key from raw parts.
    #[must_use]
    pub const fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    /// Create an inode key from file metadata.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        }
    }
}

/// Remaining link counts per inode, local to one bucket.
///
/// Seeded from the `st_nlink` values seen at scan time. The count includes
/// names outside the scanned trees, so an inode that is still referenced
/// elsewhere never reaches zero.
#[derive(Debug, Default)]
pub struct LinkLedger {
    remaining: HashMap<InodeKey, u64>,
}

impl LinkLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an inode with its scan-time link count.
    ///
    /// Later observations of the same inode do not overwrite the first.
    pub fn observe(&mut self, key: InodeKey, link_count: u64) {
        self.remaining.entry(key).or_insert(link_count);
    }

    /// Account for one more name pointing at `key`.
    pub fn gain(&mut self, key: InodeKey) {
        *self.remaining.entry(key).or_insert(0) += 1;
    }

    /// Account for one name of `key` being replaced.
    ///
    /// Returns `true` when this was the inode's last known name, meaning its
    /// data is freed once the link goes through.
    pub fn release(&mut self, key: InodeKey) -> bool {
        match self.remaining.get_mut(&key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(count) if *count == 1 => {
                *count = 0;
                true
            }
            _ => false,
        }
    }

    /// Remaining link count for `key`, if tracked.
    #[must_use]
    pub fn remaining(&self, key: InodeKey) -> Option<u64> {
        self.remaining.get(&key).copied()
    }
}
