// Per-transfer progress computation

use std::path::Path;

use super::models::DownloadProgress;
use super::traits::{ProgressReporter, TransferHooks};

/// Converts "bytes remaining" notifications into percentages for one transfer.
///
/// The reported percentage is clamped to `0..=100` and never goes backwards,
/// even if the resolver reports a larger remainder than before.
pub struct ProgressTracker<'a> {
    reporter: &'a dyn ProgressReporter,
    total: u64,
    label: Option<String>,
    last_percent: f32,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(reporter: &'a dyn ProgressReporter, total: u64) -> Self {
        Self {
            reporter,
            total,
            label: None,
            last_percent: 0.0,
        }
    }

    /// Tag status lines with a track name ("video track", "audio track")
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn percent(&self) -> f32 {
        self.last_percent
    }

    fn compute(&self, bytes_remaining: u64) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        let downloaded = self.total.saturating_sub(bytes_remaining);
        ((downloaded as f64 / self.total as f64) * 100.0).clamp(0.0, 100.0) as f32
    }

    fn status(&self, text: String) -> String {
        match &self.label {
            Some(label) => format!("{} ({})", text, label),
            None => text,
        }
    }
}

impl TransferHooks for ProgressTracker<'_> {
    fn on_start(&mut self, total: u64) {
        if total > 0 {
            self.total = total;
        }
    }

    fn on_progress(&mut self, bytes_remaining: u64) {
        let percent = self.compute(bytes_remaining).max(self.last_percent);
        self.last_percent = percent;
        let status = self.status(format!("Downloading: {:.2}%", percent));
        self.reporter.report(DownloadProgress::new(percent, status));
    }

    fn on_complete(&mut self, path: &Path) {
        tracing::debug!(path = %path.display(), "transfer complete");
        self.last_percent = 100.0;
        let status = self.status("Download complete!".to_string());
        self.reporter.report(DownloadProgress::new(100.0, status));
    }
}
