//! Managed tool acquisition: detection, version discovery, install and update.
//!
//! # Structure
//!
//! - `spec` - per-platform release asset selection for each tool
//! - `github` - `ReleaseSource` backed by the GitHub releases API
//! - `record` - persisted `versions.json` with serialized read-modify-write
//! - `manager` - `DependencyManager`, the per-tool state machine
//! - `error` - `DependencyError`

mod error;
mod github;
mod manager;
mod record;
mod spec;

pub use error::DependencyError;
pub use github::{DEFAULT_GITHUB_API, GitHubReleaseSource};
pub use manager::{DependencyManager, DependencyManagerConfig};
pub use record::VersionStore;
pub use spec::{AssetSelector, DependencySpec, PrebuiltAvailability, default_specs};
