//! Command handlers.
//!
//! Handlers are thin: they turn CLI input into domain calls on the
//! [`CliContext`](crate::CliContext) services and format the results for
//! the terminal. They never spawn processes or touch the network directly.

pub mod config;
pub mod deps;
pub mod fetch;
pub mod options;
pub mod paths;
pub mod preview;
pub mod queue;
pub mod title;
