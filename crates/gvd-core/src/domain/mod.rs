//! Core domain types.
//!
//! These types represent the pure domain model, independent of any
//! infrastructure concerns (processes, network, filesystem).
//!
//! # Structure
//!
//! - `job` - Media job options (`JobOptions`, `TimeRange`, `CookieSource`)
//! - `dependency` - Managed tool lifecycle (`DependencyKind`, `DependencyState`, records)
//! - `queue` - Persisted download queue entries (`QueueItem`, `QueueStatus`)

mod dependency;
mod job;
mod queue;

pub use dependency::{
    DependencyKind, DependencyRecord, DependencyState, PersistedVersion, VersionRecordFile,
};
pub use job::{CookieSource, JobId, JobOptions, SubtitleMode, TimeRange, selector};
pub use queue::{QueueItem, QueueItemId, QueueStatus};
