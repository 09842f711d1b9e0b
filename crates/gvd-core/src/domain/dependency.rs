//! Managed external tool types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two externally acquired tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DependencyKind {
    /// The media fetch tool.
    #[serde(rename = "yt-dlp")]
    YtDlp,
    /// The media encoding tool.
    #[serde(rename = "ffmpeg")]
    Ffmpeg,
}

impl DependencyKind {
    pub const ALL: [Self; 2] = [Self::YtDlp, Self::Ffmpeg];

    /// Stable name used in events, records and on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            Self::YtDlp => "yt-dlp",
            Self::Ffmpeg => "ffmpeg",
        }
    }

    /// Tool names (without platform extension) that must exist for the
    /// dependency to count as installed.
    pub const fn executables(self) -> &'static [&'static str] {
        match self {
            Self::YtDlp => &["yt-dlp"],
            Self::Ffmpeg => &["ffmpeg", "ffprobe"],
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| wanted.to_string())
    }
}

/// Lifecycle state of one dependency.
///
/// ```text
/// Unknown -> NotInstalled | Installed
/// Installed -> CheckingUpdate -> Installed | UpdateAvailable
/// NotInstalled | UpdateAvailable -> Installing | Updating -> Installed
/// any -> Failed -> NotInstalled | Installed (retry)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyState {
    #[default]
    Unknown,
    NotInstalled,
    Installed,
    CheckingUpdate,
    UpdateAvailable,
    Installing,
    Updating,
    Failed,
}

impl DependencyState {
    /// True while an install or update is running.
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Installing | Self::Updating)
    }
}

impl fmt::Display for DependencyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::NotInstalled => "not installed",
            Self::Installed => "installed",
            Self::CheckingUpdate => "checking for updates",
            Self::UpdateAvailable => "update available",
            Self::Installing => "installing",
            Self::Updating => "updating",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// In-memory view of one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub kind: DependencyKind,
    pub installed_version: Option<String>,
    pub latest_version: Option<String>,
    /// Directory the executables live in.
    pub install_path: PathBuf,
    pub state: DependencyState,
}

impl DependencyRecord {
    pub const fn new(kind: DependencyKind, install_path: PathBuf) -> Self {
        Self {
            kind,
            installed_version: None,
            latest_version: None,
            install_path,
            state: DependencyState::Unknown,
        }
    }
}

/// Versions persisted for one dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedVersion {
    pub installed_version: Option<String>,
    pub latest_version: Option<String>,
    pub installed_at: Option<DateTime<Utc>>,
    pub last_checked: Option<DateTime<Utc>>,
}

/// On-disk shape of `versions.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionRecordFile {
    pub dependencies: BTreeMap<DependencyKind, PersistedVersion>,
}

impl VersionRecordFile {
    /// Parse a record file, treating malformed content as empty.
    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed version record");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn get(&self, kind: DependencyKind) -> Option<&PersistedVersion> {
        self.dependencies.get(&kind)
    }

    /// Record a completed install of `version`.
    pub fn mark_installed(&mut self, kind: DependencyKind, version: &str) {
        let entry = self.dependencies.entry(kind).or_default();
        entry.installed_version = Some(version.to_string());
        entry.latest_version = Some(version.to_string());
        entry.installed_at = Some(Utc::now());
    }

    /// Record the outcome of a remote version query.
    pub fn mark_checked(&mut self, kind: DependencyKind, latest: &str) {
        let entry = self.dependencies.entry(kind).or_default();
        entry.latest_version = Some(latest.to_string());
        entry.last_checked = Some(Utc::now());
    }
}
