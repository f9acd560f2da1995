//! Terminal progress bars driven by engine observers and tracker callbacks.

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

/// Progress bar for one file
pub struct TransferProgress {
    bar: ProgressBar,
}

impl TransferProgress {
    /// Create a bar for `total_bytes`, titled `"<action>: <filename>"`
    #[must_use]
    pub fn new(total_bytes: u64, action: &str, filename: &str) -> Self {
        let bar = ProgressBar::new(total_bytes);

        bar.set_style(
            ProgressStyle::default_bar()
                .template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        bar.set_message(format!("{action}: {filename}"));

        Self { bar }
    }

    /// A bar that draws nothing, for machine-readable output
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Observer for [`r2index_checksum::ChecksumEngine::with_progress`]
    pub fn observer(&self) -> impl Fn(u64, u64) + Send + Sync + 'static {
        let bar = self.bar.clone();
        move |bytes_read, total| {
            bar.set_length(total);
            bar.set_position(bytes_read);
        }
    }

    /// Callback for [`r2index_progress::TransferOptions::with_callback`]
    pub fn callback(&self) -> impl Fn(u64) + Send + Sync + 'static {
        let bar = self.bar.clone();
        move |cumulative| bar.set_position(cumulative)
    }

    /// Finish with custom message
    pub fn finish_with_message(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    /// Abandon the progress bar (for errors)
    pub fn abandon(&self) {
        self.bar.abandon();
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }

    #[cfg(test)]
    fn length(&self) -> Option<u64> {
        self.bar.length()
    }
}
