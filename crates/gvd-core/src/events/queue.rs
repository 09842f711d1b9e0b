//! Download queue events.

use serde::{Deserialize, Serialize};

use crate::domain::{JobId, QueueItemId, QueueStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    /// Entries were added or removed.
    Updated,
    StatusChanged {
        item_id: QueueItemId,
        status: QueueStatus,
        /// Job running the entry, while it downloads.
        job_id: Option<JobId>,
    },
    Progress { item_id: QueueItemId, percent: f64 },
    ItemFinished {
        item_id: QueueItemId,
        title: String,
        success: bool,
    },
    /// A run started with "start all" has nothing left to do.
    AllFinished,
}

impl QueueEvent {
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Updated => "queue:updated",
            Self::StatusChanged { .. } => "queue:status",
            Self::Progress { .. } => "queue:progress",
            Self::ItemFinished { .. } => "queue:item-finished",
            Self::AllFinished => "queue:all-finished",
        }
    }
}
