//! Canonical event union for everything the core reports to a front end.
//!
//! # Structure
//!
//! - `job` - Media job lifecycle, output and progress events
//! - `dependency` - Install/update state, progress and completion events
//! - `queue` - Download queue changes and sequential-run completion
//!
//! # Wire Format
//!
//! ```json
//! { "kind": "job", "event": { "type": "progress", "job_id": "...", "percent": 42.5, "eta": null } }
//! ```

mod dependency;
mod job;
mod queue;

use serde::{Deserialize, Serialize};

pub use dependency::DependencyEvent;
pub use job::{JobEvent, JobOutcome};
pub use queue::QueueEvent;

/// All events emitted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    Job(JobEvent),
    Dependency(DependencyEvent),
    Queue(QueueEvent),
}

impl AppEvent {
    /// Stable event name for logging and routing.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Job(event) => event.event_name(),
            Self::Dependency(event) => event.event_name(),
            Self::Queue(event) => event.event_name(),
        }
    }
}

impl From<JobEvent> for AppEvent {
    fn from(event: JobEvent) -> Self {
        Self::Job(event)
    }
}

impl From<DependencyEvent> for AppEvent {
    fn from(event: DependencyEvent) -> Self {
        Self::Dependency(event)
    }
}

impl From<QueueEvent> for AppEvent {
    fn from(event: QueueEvent) -> Self {
        Self::Queue(event)
    }
}
