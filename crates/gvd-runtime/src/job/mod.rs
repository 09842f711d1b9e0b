//! Media job orchestration.
//!
//! # Structure
//!
//! - `VideoJobController` - validate, spawn, stream, classify, stop
//! - `JobLogManager` - bounded per-job output retention
//! - `JobError` - job failure taxonomy

mod controller;
mod error;
mod logs;

pub use controller::{FAILURE_MESSAGE, JobWatch, ToolPaths, VideoJobController};
pub use error::JobError;
pub use logs::{JobLogEntry, JobLogManager, MAX_LOG_LINES};
