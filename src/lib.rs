//! hardlink - replace duplicate files with hardlinks.
//!
//! The crate is split into a read-only [`scanner`] that groups regular files
//! by a metadata [`scanner::Fingerprint`], and a [`linker`] that compares
//! the members of each group and replaces identical copies with hardlinks
//! through a rename-backup protocol.
//!
//! [`run_app`] wires both together behind the command line in [`cli`].

#[cfg(not(unix))]
compile_error!("hardlink relies on Unix device, inode and ownership metadata");

pub mod cli;
pub mod config;
pub mod error;
pub mod linker;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::config::Settings;
use crate::error::ExitCode;
use crate::output::{JsonOutput, RunSummary, TextOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::Walker;

/// Run the tool for a parsed command line.
///
/// Per-file failures are logged and counted but never make this return an
/// error; only setup problems do.
///
/// # Errors
///
/// Returns an error for unusable configuration, invalid patterns, a signal
/// handler that cannot be installed, a worker pool that cannot be built, or
/// statistics that cannot be written.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);

    let settings = Settings::load(&cli).context("Failed to load configuration")?;
    log::debug!("Effective settings: {:?}", settings);

    let walker_config = settings
        .walker_config()
        .context("Invalid include/exclude pattern")?;
    let handler = signal::install_handler().context("Failed to set up signal handling")?;

    let show_progress =
        !cli.quiet && !cli.no_progress && cli.verbose == 0 && std::io::stderr().is_terminal();
    let progress: Option<Arc<dyn ProgressCallback>> =
        show_progress.then(|| Arc::new(Progress::new(false)) as Arc<dyn ProgressCallback>);

    let started = Instant::now();

    let mut walker = Walker::new(cli.directories.clone(), walker_config)
        .with_shutdown_flag(handler.get_flag());
    if let Some(ref callback) = progress {
        walker = walker.with_progress_callback(Arc::clone(callback));
    }
    let scan = walker.scan();
    log::info!(
        "Scanned {} files into {} candidate buckets",
        scan.stats.files,
        scan.candidate_buckets()
    );

    let mut reducer_config = settings
        .reducer_config()
        .with_shutdown_flag(handler.get_flag());
    if let Some(callback) = progress {
        reducer_config = reducer_config.with_progress_callback(callback);
    }

    let files = scan.stats.files;
    let scan_errors = scan.stats.errors.len();
    let scan_interrupted = scan.stats.interrupted;
    let stats = linker::reduce(scan.buckets, &reducer_config)
        .context("Failed to start linking")?;

    let summary = RunSummary::new(
        settings.dry_run,
        files,
        scan_errors,
        stats,
        started.elapsed(),
    );

    let exit_code = if scan_interrupted || summary.link.interrupted {
        ExitCode::Interrupted
    } else {
        ExitCode::Success
    };

    if summary.link.critical > 0 {
        log::error!(
            "{} file(s) could not be restored; their content is in *.hardlink-{} backups",
            summary.link.critical,
            std::process::id()
        );
    }

    if !cli.quiet {
        let mut stdout = std::io::stdout().lock();
        match cli.output {
            OutputFormat::Text => TextOutput::new(&summary)
                .write_to(&mut stdout)
                .context("Failed to write statistics")?,
            OutputFormat::Json => JsonOutput::new(&summary, exit_code)
                .write_to(&mut stdout)
                .context("Failed to write statistics")?,
        }
    }

    Ok(exit_code)
}
