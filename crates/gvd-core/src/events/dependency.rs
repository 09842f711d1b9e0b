//! Dependency lifecycle events.

use serde::{Deserialize, Serialize};

use crate::domain::DependencyState;

/// Events produced by the dependency manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DependencyEvent {
    StateChanged { name: String, state: DependencyState },
    /// Whole-number percent of the current install/update download.
    Progress { name: String, percent: u8 },
    /// Non-fatal notice, e.g. the version source was unreachable.
    Info { name: String, message: String },
    /// Exactly one per install/update invocation.
    Finished {
        name: String,
        success: bool,
        message: String,
    },
}

impl DependencyEvent {
    pub fn name(&self) -> &str {
        match self {
            Self::StateChanged { name, .. }
            | Self::Progress { name, .. }
            | Self::Info { name, .. }
            | Self::Finished { name, .. } => name,
        }
    }

    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "dependency:state",
            Self::Progress { .. } => "dependency:progress",
            Self::Info { .. } => "dependency:info",
            Self::Finished { .. } => "dependency:finished",
        }
    }
}
