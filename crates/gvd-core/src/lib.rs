//! Core domain types and port definitions for gvd.
//!
//! This crate holds everything that is independent of process spawning and
//! network I/O: job options, dependency records, the event union consumed by
//! front ends, path resolution, persisted settings, and the traits that the
//! runtime crate implements.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod paths;
pub mod ports;
pub mod settings;
pub mod utils;
pub mod version;

// Re-export commonly used types for convenience
pub use domain::{
    CookieSource, DependencyKind, DependencyRecord, DependencyState, JobId, JobOptions,
    PersistedVersion, QueueItem, QueueItemId, QueueStatus, SubtitleMode, TimeRange,
    VersionRecordFile,
};
pub use events::{AppEvent, DependencyEvent, JobEvent, JobOutcome, QueueEvent};
pub use ports::{
    AppEventEmitter, ConnectivityProbe, NoopEmitter, ReleaseAsset, ReleaseInfo, ReleaseSource,
    ReleaseSourceError, StaticProbe,
};
pub use settings::{
    Settings, SettingsError, SettingsUpdate, load_settings, save_settings, validate_settings,
};
pub use utils::validation::{ValidationError, validate_job_options, validate_url};
pub use version::{Version, is_update_available};

// Re-export path utilities
pub use paths::{
    PathError, config_path, data_root, executable_name, queue_path, requirements_dir, tool_path,
    versions_path,
};

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio as _;
