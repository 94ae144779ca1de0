use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a spinner for indeterminate progress. Hidden when `visible` is false.
pub fn create_spinner(msg: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} ({elapsed})") {
        pb.set_style(style.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Finish and clear progress bar
pub fn finish_and_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}
