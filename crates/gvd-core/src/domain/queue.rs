//! Download queue entries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::job::JobOptions;

/// Stable identifier of a queue entry; survives restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueItemId(Uuid);

impl QueueItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QueueItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Where an entry is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    /// Added, not started yet.
    #[default]
    Queued,
    /// Started by the user while another entry was downloading.
    Waiting,
    Downloading,
    /// Cancelled, or interrupted by a restart.
    Stopped,
    Finished,
    Failed,
}

impl QueueStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Waiting => "Waiting...",
            Self::Downloading => "Downloading",
            Self::Stopped => "Stopped",
            Self::Finished => "Finished",
            Self::Failed => "Error",
        }
    }

    /// Status to show after a restart. Nothing survives a restart running.
    #[must_use]
    pub const fn restored(self) -> Self {
        match self {
            Self::Waiting | Self::Downloading => Self::Stopped,
            other => other,
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One queued download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: QueueItemId,
    /// Video title, or the URL when the title could not be looked up.
    pub title: String,
    pub options: JobOptions,
    #[serde(default)]
    pub status: QueueStatus,
    /// Last known percent complete.
    #[serde(default)]
    pub progress: f64,
}

impl QueueItem {
    /// New `Queued` entry. A blank title falls back to the URL.
    pub fn new(title: &str, options: JobOptions) -> Self {
        let title = match title.trim() {
            "" => options.url.trim().to_string(),
            t => t.to_string(),
        };
        Self {
            id: QueueItemId::new(),
            title,
            options,
            status: QueueStatus::Queued,
            progress: 0.0,
        }
    }
}
