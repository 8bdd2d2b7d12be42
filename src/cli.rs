//! Command-line interface definitions.
//!
//! Short options follow the classic `hardlink` tool, so existing scripts
//! keep working.
//!
//! # Example
//!
//! ```bash
//! # Preview what would be linked
//! hardlink -n -v ~/photos ~/backup/photos
//!
//! # Link on content alone, skipping temporary files
//! hardlink -c -x '\.tmp$' /srv/data
//!
//! # Machine-readable statistics
//! hardlink --output json /srv/data
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replace duplicate files with hardlinks.
///
/// Files are grouped by size, device and (unless ignored) mode, owner and
/// modification time. Files in the same group are compared byte for byte
/// and identical ones are replaced by hardlinks to a single copy.
#[derive(Debug, Parser)]
#[command(name = "hardlink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories (or files) to scan
    #[arg(value_name = "DIRECTORY", required = true)]
    pub directories: Vec<PathBuf>,

    /// Modify nothing, just print what would happen
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Filenames have to be identical
    #[arg(short = 'f', long)]
    pub respect_name: bool,

    /// Ignore differences in file mode
    #[arg(short = 'p', long)]
    pub ignore_mode: bool,

    /// Ignore differences in owner and group
    #[arg(short = 'o', long)]
    pub ignore_owner: bool,

    /// Ignore differences in modification time
    ///
    /// The newer file is kept unless -m or -M decides otherwise.
    #[arg(short = 't', long)]
    pub ignore_time: bool,

    /// Only compare file contents (same as -pot)
    #[arg(short = 'c', long)]
    pub content_only: bool,

    /// Keep the file with the highest link count, replace the other
    #[arg(short = 'm', long, conflicts_with = "minimize")]
    pub maximize: bool,

    /// Keep the file with the lowest link count, replace the other
    #[arg(short = 'M', long)]
    pub minimize: bool,

    /// Regular expression to exclude files (can be given multiple times)
    #[arg(short = 'x', long, value_name = "REGEXP")]
    pub exclude: Vec<String>,

    /// Regular expression to include files, overriding excludes
    #[arg(short = 'i', long, value_name = "REGEXP")]
    pub include: Vec<String>,

    /// Increase verbosity (-v links, -vv comparisons, -vvv every file)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors; no statistics
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Worker threads for comparing and linking (default: 1)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Statistics format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Disable the progress display
    #[arg(long)]
    pub no_progress: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Format of the end-of-run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain text
    Text,
    /// JSON object
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
