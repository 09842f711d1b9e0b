//! Media job events.

use serde::{Deserialize, Serialize};

use crate::domain::JobId;

/// Terminal result of a media job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded,
    Failed { message: String },
    /// Stopped by the user; not an error.
    Cancelled,
}

impl JobOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Short user-presentable message.
    pub fn message(&self) -> &str {
        match self {
            Self::Succeeded => "Download completed successfully.",
            Self::Failed { message } => message,
            Self::Cancelled => "Download stopped by user.",
        }
    }
}

/// Events produced while a media job runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// The tool was spawned with this argument vector.
    Started { job_id: JobId, command: Vec<String> },
    /// One raw output line, verbatim.
    Output { job_id: JobId, line: String },
    /// Percent complete, optionally with the tool's ETA.
    Progress {
        job_id: JobId,
        percent: f64,
        eta: Option<String>,
    },
    /// Exactly one per started job.
    Finished { job_id: JobId, outcome: JobOutcome },
}

impl JobEvent {
    pub const fn job_id(&self) -> JobId {
        match self {
            Self::Started { job_id, .. }
            | Self::Output { job_id, .. }
            | Self::Progress { job_id, .. }
            | Self::Finished { job_id, .. } => *job_id,
        }
    }

    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "job:started",
            Self::Output { .. } => "job:output",
            Self::Progress { .. } => "job:progress",
            Self::Finished { .. } => "job:finished",
        }
    }
}
