//! Progress reporting utilities using indicatif.
//!
//! The scanner and the reducer only see the [`ProgressCallback`] trait;
//! [`Progress`] renders it as a spinner while scanning and a bar while
//! linking. Both draw to stderr, so statistics on stdout stay clean.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress callback for the scan and link phases.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ("scanning" or "linking")
    /// * `total` - Total number of items, or 0 when unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    scanning: Mutex<Option<ProgressBar>>,
    linking: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use hardlink::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
            scanning: Mutex::new(None),
            linking: Mutex::new(None),
            quiet,
        }
    }

    fn scanning_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn linking_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} buckets ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn slot(&self, phase: &str) -> Option<&Mutex<Option<ProgressBar>>> {
        match phase {
            "scanning" => Some(&self.scanning),
            "linking" => Some(&self.linking),
            _ => None,
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = match phase {
            "scanning" => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::scanning_style());
                pb.set_message("Scanning");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            "linking" => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::linking_style());
                pb.set_message("Linking");
                pb
            }
            _ => return,
        };

        if let Some(Ok(mut slot)) = self.slot(phase).map(Mutex::lock) {
            *slot = Some(pb);
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        for slot in [&self.linking, &self.scanning] {
            if let Ok(guard) = slot.lock() {
                if let Some(ref pb) = *guard {
                    pb.set_position(current as u64);
                    pb.set_message(truncate_path(path, 40));
                    return;
                }
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Some(Ok(mut slot)) = self.slot(phase).map(Mutex::lock) {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let count = file_name.chars().count();
    if count + 4 > max_len {
        let tail: String = file_name.chars().skip(count + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
