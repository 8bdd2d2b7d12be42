//! Logging setup using the `log` facade and `env_logger`.
//!
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (errors only) or `-v` repeated
//! 3. Default: warn, so only per-file failures are shown
//!
//! | Flag    | Level | Typical records                              |
//! |---------|-------|----------------------------------------------|
//! | `-q`    | error | restore failures                             |
//! | (none)  | warn  | stat, compare and link failures              |
//! | `-v`    | info  | `[DryRun] Linking a to b (-4 KiB)`           |
//! | `-vv`   | debug | `Comparing a to b`                           |
//! | `-vvv`  | trace | `Visiting path`                              |

use env_logger::{Builder, WriteStyle};
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize the logging subsystem from CLI flags.
///
/// Must be called once, before any logging. Later calls are ignored so
/// integration tests can run the application repeatedly.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI
/// * `quiet` - Only show errors (overridden by `RUST_LOG`)
/// * `no_color` - Disable ANSI styling of level tags
pub fn init_logging(verbose: u8, quiet: bool, no_color: bool) {
    let use_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();
    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    if no_color {
        builder.write_style(WriteStyle::Never);
    }

    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if verbose >= 3 {
            writeln!(
                buf,
                "{style}{:<5}{style:#} [{}] {}",
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        }
    });

    if builder.try_init().is_ok() {
        log::debug!("Logging initialized at level: {}", log::max_level());
    }
}

/// Map CLI flags to a level filter.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
