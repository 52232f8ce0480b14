//! Terminal progress for a bundle run.

use fhir_core::{FileResult, RunObserver};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner:.cyan} [{bar:32.cyan/blue}] {pos}/{len} {msg}";

/// Advances one tick per finished file. Draws nothing when stderr is not a
/// terminal.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver for ProgressObserver {
    fn files_discovered(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn file_finished(&self, result: &FileResult) {
        self.bar.set_message(result.file.clone());
        self.bar.inc(1);
    }
}
