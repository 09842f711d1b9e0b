//! Shared CLI presentation utilities.
//!
//! Format-only helpers: no domain decisions are made here.

pub mod progress;
pub mod tables;

pub use progress::{bar_position, dependency_bar, job_bar};
pub use tables::{format_optional, print_separator, state_label};
