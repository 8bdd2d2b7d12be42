//! Byte-for-byte content comparison.
//!
//! Files are read side by side in fixed-size chunks so memory use stays
//! bounded regardless of file size. The comparison stops at the first chunk
//! that differs.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Chunk size used for each side of a comparison (1 MiB).
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Errors that can occur while comparing two files.
#[derive(Debug, Error)]
pub enum CompareError {
    /// A file could not be opened.
    #[error("cannot open {path}: {source}")]
    Open {
        /// Path that failed to open
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A read failed part-way through.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Path that failed to read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Whether `a` and `b` have identical contents.
///
/// Two empty files are equal.
///
/// # Errors
///
/// Returns a [`CompareError`] naming the file that could not be opened or
/// read. Callers treat that pair as not linkable.
pub fn contents_equal(a: &Path, b: &Path) -> Result<bool, CompareError> {
    contents_equal_with_chunk(a, b, CHUNK_SIZE)
}

pub(crate) fn contents_equal_with_chunk(
    a: &Path,
    b: &Path,
    chunk: usize,
) -> Result<bool, CompareError> {
    let mut fa = open(a)?;
    let mut fb = open(b)?;

    let mut buf_a = vec![0u8; chunk];
    let mut buf_b = vec![0u8; chunk];

    loop {
        let na = fill(&mut fa, &mut buf_a).map_err(|source| CompareError::Read {
            path: a.to_path_buf(),
            source,
        })?;
        let nb = fill(&mut fb, &mut buf_b).map_err(|source| CompareError::Read {
            path: b.to_path_buf(),
            source,
        })?;

        if na != nb || buf_a[..na] != buf_b[..nb] {
            return Ok(false);
        }
        if na < chunk {
            return Ok(true);
        }
    }
}

fn open(path: &Path) -> Result<File, CompareError> {
    File::open(path).map_err(|source| CompareError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Read until `buf` is full or the reader hits EOF.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
