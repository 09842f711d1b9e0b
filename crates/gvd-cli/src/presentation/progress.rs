//! Terminal progress bars.

use indicatif::{ProgressBar, ProgressStyle};

const BAR_CHARS: &str = "█▓░";

fn percent_bar(template: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(BAR_CHARS);
    pb.set_style(style);
    pb
}

/// Bar for a media download; the message slot carries the ETA.
pub fn job_bar() -> ProgressBar {
    percent_bar("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
}

/// Bar for a tool install or update.
pub fn dependency_bar(name: &str) -> ProgressBar {
    let pb = percent_bar("{prefix:>8} [{bar:40.cyan/blue}] {pos:>3}% {msg}");
    pb.set_prefix(name.to_string());
    pb
}

/// Whole-percent bar position from a fractional percent.
pub fn bar_position(percent: f64) -> u64 {
    percent.clamp(0.0, 100.0).round() as u64
}
