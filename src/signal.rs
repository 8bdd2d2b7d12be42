//! Cooperative shutdown on Ctrl+C and SIGTERM.
//!
//! A single `AtomicBool` is shared with the walker and the reducer. When a
//! signal arrives the flag is set; the walker stops yielding entries and the
//! reducer stops before the next round or pair. A link operation that has
//! already started always runs to completion, so no backup file is left
//! behind by an interrupt.
//!
//! # Usage
//!
//! ```rust,no_run
//! use hardlink::signal::install_handler;
//! use hardlink::linker::ReducerConfig;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let config = ReducerConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a signal arrived or [`request_shutdown`](Self::request_shutdown) was called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag by hand.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag for the walker and reducer.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the handler.
    #[error("Failed to install signal handler")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide signal handler.
///
/// Repeated calls (integration tests drive [`crate::run_app`] many times in
/// one process) return the already installed handler with its flag cleared.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the handler cannot be
/// registered and none was registered before.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing current link...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Signal handler already registered, using unhooked handler");
            Ok(GLOBAL_HANDLER.get_or_init(ShutdownHandler::new).clone())
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}
