//! Include/exclude path filtering with regular expressions.
//!
//! Patterns are matched anywhere in the full path string (search, not
//! anchored match). The decision rule is:
//!
//! 1. If exclude patterns exist, the path matches one of them and matches
//!    no include pattern, the path is skipped.
//! 2. Otherwise, if include patterns exist and the path matches none of
//!    them, the path is skipped.
//! 3. Otherwise the path is scanned.
//!
//! Include patterns therefore override excludes, and act as a whitelist on
//! their own.
//!
//! Matching runs over the raw path bytes, so names that are not valid UTF-8
//! are matched as they are on disk.

use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use regex::bytes::Regex;
use thiserror::Error;

/// Error raised when a user-supplied pattern does not compile.
#[derive(Debug, Error)]
#[error("could not compile regular expression '{pattern}'")]
pub struct PatternError {
    /// The offending pattern
    pub pattern: String,
    /// The underlying regex error
    #[source]
    pub source: regex::Error,
}

/// Compiled include and exclude patterns.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PathFilter {
    /// Compile the given pattern lists.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for the first pattern that fails to compile.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, PatternError> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// A filter that accepts every path.
    #[must_use]
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Decide whether `path` should be scanned.
    #[must_use]
    pub fn allows<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref().as_os_str().as_bytes();
        let included = self.include.iter().any(|re| re.is_match(path));

        if !self.exclude.is_empty() && !included && self.exclude.iter().any(|re| re.is_match(path))
        {
            return false;
        }
        if !self.include.is_empty() && !included {
            return false;
        }
        true
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, PatternError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p.as_ref()).map_err(|source| PatternError {
                pattern: p.as_ref().to_string(),
                source,
            })
        })
        .collect()
}
