//! Progress tracking and reporting

use indicatif::{ProgressBar, ProgressStyle};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} actions {msg}";

/// Progress bar over the actions of one pass
pub struct ProgressTracker {
    progress_bar: ProgressBar,
    bytes_copied: u64,
}

impl ProgressTracker {
    /// Visible bar sized to `total_actions`
    #[must_use]
    pub fn new(total_actions: u64) -> Self {
        let pb = ProgressBar::new(total_actions);
        pb.set_style(
            ProgressStyle::with_template(PROGRESS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self::with_bar(pb)
    }

    /// Tracker that draws nothing
    #[must_use]
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(progress_bar: ProgressBar) -> Self {
        Self {
            progress_bar,
            bytes_copied: 0,
        }
    }

    /// Count one finished action
    pub fn update(&mut self, bytes: u64) {
        self.bytes_copied += bytes;
        self.progress_bar.inc(1);
        self.progress_bar
            .set_message(format!("({})", indicatif::HumanBytes(self.bytes_copied)));
    }

    /// Run `f` with the bar cleared so console lines are not garbled
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.progress_bar.suspend(f)
    }

    /// Remove the bar
    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }
}
