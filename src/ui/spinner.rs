// Sat Oct 17 2026 - Alex

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Spinner shown while module workers run. Hidden when output is quiet.
pub struct ScanSpinner {
    spinner: ProgressBar,
}

impl ScanSpinner {
    pub fn new(message: &str, visible: bool) -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let spinner = ProgressBar::new_spinner();
        if !visible {
            spinner.set_draw_target(ProgressDrawTarget::hidden());
        }
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        if visible {
            spinner.enable_steady_tick(Duration::from_millis(80));
        }

        Self { spinner }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}
