//! Child process execution with streamed output and cooperative cancellation.
//!
//! # Structure
//!
//! - `ProcessRunner` / `LaunchSpec` - spawn a tool with piped output
//! - `ProcessHandle` - line stream, cancel control and exit outcome
//! - `shutdown_child` - SIGTERM with SIGKILL escalation
//!
//! Stdout and stderr of a streamed child share one pipe and one reader, so
//! lines arrive in the order the child wrote them.

mod runner;
mod shutdown;
mod stream;

pub use runner::{
    CapturedOutput, ExitOutcome, LaunchSpec, OutputLine, ProcessHandle, ProcessRunner, RunnerError,
};
pub use shutdown::{Shutdown, TERM_GRACE, shutdown_child};
