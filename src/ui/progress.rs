use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::source::PreloadEntry;

/// Progress bar for preloading configured pages. Hidden when stdout is not a terminal.
pub struct PreloadProgress {
    bar: ProgressBar,
}

impl PreloadProgress {
    pub fn new(total: usize) -> Self {
        let bar = if console::Term::stdout().is_term() {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
                bar.set_style(style.progress_chars("=> "));
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    pub fn page_done(&self, entry: &PreloadEntry) {
        self.bar.set_message(entry.title.clone());
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
