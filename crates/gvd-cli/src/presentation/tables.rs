//! Table formatting utilities for CLI output.

use gvd_core::DependencyState;

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Format an optional value for table display, returning a default if None.
pub fn format_optional<T: std::fmt::Display>(value: Option<&T>, default: &str) -> String {
    value.map_or_else(|| default.to_string(), ToString::to_string)
}

/// Human label for a dependency state.
pub const fn state_label(state: DependencyState) -> &'static str {
    match state {
        DependencyState::Unknown => "unknown",
        DependencyState::NotInstalled => "not installed",
        DependencyState::Installed => "installed",
        DependencyState::CheckingUpdate => "checking for updates",
        DependencyState::UpdateAvailable => "update available",
        DependencyState::Installing => "installing",
        DependencyState::Updating => "updating",
        DependencyState::Failed => "failed",
    }
}
