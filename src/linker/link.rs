//! Replacing a file with a hardlink, guarded by a rename backup.
//!
//! # Overview
//!
//! Given a `source` whose content is kept and a `target` that becomes a
//! link to it:
//!
//! 1. Refuse if the backup path `<target>.hardlink-<pid>` already exists.
//! 2. Rename `target` to the backup path.
//! 3. Create the hardlink at `target`. On failure, rename the backup back.
//! 4. Remove the backup.
//!
//! The only state that puts data at risk is a failed link followed by a
//! failed restore: the original content then lives only at the backup path.
//! That case is [`LinkError::RestoreFailed`] and is the only critical error.
//!
//! In dry-run mode the backup check still runs (it is read-only) but no
//! rename, link or unlink is issued.
//!
//! # Safety
//!
//! All filesystem calls go through a [`LinkBackend`] so the protocol can be
//! exercised with injected failures.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Filesystem operations used by the link protocol.
pub trait LinkBackend: Send + Sync {
    /// Whether anything (including a dangling symlink) exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Rename `from` to `to`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create a hardlink at `link` pointing to `original`.
    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()>;

    /// Remove the file at `path`.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl LinkBackend for StdFs {
    fn exists(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(path).is_ok()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()> {
        std::fs::hard_link(original, link)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

/// Error type for link attempts.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Something already occupies the backup path.
    #[error("backup file {backup} already exists, not linking {target}")]
    BackupExists {
        /// File that would have been replaced
        target: PathBuf,
        /// Conflicting backup path
        backup: PathBuf,
    },

    /// Moving the target out of the way failed; nothing was changed.
    #[error("renaming {from} to {to} failed: {source}")]
    Rename {
        /// Rename source
        from: PathBuf,
        /// Rename destination
        to: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Creating the link failed; the target was restored from its backup.
    #[error("linking {source_path} to {target} failed: {source}")]
    Link {
        /// File whose content is kept
        source_path: PathBuf,
        /// Path that should have become a link
        target: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Creating the link failed and the backup could not be moved back.
    #[error(
        "cannot restore {target} from backup {backup} after failed link ({link_error}): {source}"
    )]
    RestoreFailed {
        /// Path that is now missing
        target: PathBuf,
        /// Where the original content now lives
        backup: PathBuf,
        /// Why the link failed in the first place
        link_error: io::Error,
        /// Why the restore failed
        #[source]
        source: io::Error,
    },
}

impl LinkError {
    /// Whether this failure left data only at the backup path.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::RestoreFailed { .. })
    }
}

/// Result of a successful link attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// `target` is now a hardlink to `source`.
    Linked,
    /// Dry run: the link would have been created.
    DryRun,
    /// The link was created but the backup could not be removed.
    BackupRetained(PathBuf),
}

/// Backup path for `target`: `<target>.hardlink-<pid>`.
#[must_use]
pub fn backup_path(target: &Path) -> PathBuf {
    backup_path_for_pid(target, std::process::id())
}

pub(crate) fn backup_path_for_pid(target: &Path, pid: u32) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(format!(".hardlink-{pid}"));
    PathBuf::from(name)
}

/// Replace `target` with a hardlink to `source`.
///
/// # Errors
///
/// Returns a [`LinkError`] describing which step failed. Every error except
/// [`LinkError::RestoreFailed`] leaves `target` with its original content.
pub fn link_file(
    source: &Path,
    target: &Path,
    dry_run: bool,
    backend: &dyn LinkBackend,
) -> Result<LinkOutcome, LinkError> {
    let backup = backup_path(target);

    if backend.exists(&backup) {
        return Err(LinkError::BackupExists {
            target: target.to_path_buf(),
            backup,
        });
    }

    if dry_run {
        return Ok(LinkOutcome::DryRun);
    }

    backend
        .rename(target, &backup)
        .map_err(|source| LinkError::Rename {
            from: target.to_path_buf(),
            to: backup.clone(),
            source,
        })?;

    if let Err(link_error) = backend.hard_link(source, target) {
        return Err(match backend.rename(&backup, target) {
            Ok(()) => LinkError::Link {
                source_path: source.to_path_buf(),
                target: target.to_path_buf(),
                source: link_error,
            },
            Err(restore_error) => LinkError::RestoreFailed {
                target: target.to_path_buf(),
                backup,
                link_error,
                source: restore_error,
            },
        });
    }

    if let Err(e) = backend.remove_file(&backup) {
        log::warn!(
            "Linked {} but could not remove backup {}: {}",
            target.display(),
            backup.display(),
            e
        );
        return Ok(LinkOutcome::BackupRetained(backup));
    }

    Ok(LinkOutcome::Linked)
}
