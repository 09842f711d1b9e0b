//! Command-line front end for gvd.
//!
//! `main.rs` is the composition root; everything else is reachable from
//! here so handlers can be tested without spawning the binary.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Used only by the binary entry point
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod config_commands;
pub mod deps_commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod queue_commands;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, FetchArgs};
pub use config_commands::ConfigCommand;
pub use deps_commands::DepsCommand;
pub use error::CliError;
pub use parser::Cli;
pub use queue_commands::QueueCommand;
