//! Remote version metadata port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DependencyKind;

/// Errors from querying a release source.
#[derive(Debug, Error)]
pub enum ReleaseSourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Release source returned HTTP {0}")]
    Status(u16),

    #[error("Malformed release metadata: {0}")]
    Malformed(String),
}

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
    pub size: u64,
}

/// Latest release metadata for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    /// RFC 3339 publication timestamp, when the source provides one.
    pub published_at: Option<String>,
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseInfo {
    /// Version string recorded for this release.
    ///
    /// Uses the tag when it contains a digit; rolling tags such as `latest`
    /// fall back to the publication timestamp.
    pub fn version(&self) -> String {
        let tag = self.tag_name.trim();
        if tag.chars().any(|c| c.is_ascii_digit()) {
            return tag.to_string();
        }
        self.published_at
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(tag)
            .to_string()
    }
}

/// Source of "latest release" metadata.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn latest_release(&self, kind: DependencyKind) -> Result<ReleaseInfo, ReleaseSourceError>;
}
