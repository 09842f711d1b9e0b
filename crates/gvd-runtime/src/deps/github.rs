//! GitHub releases API as a release source.

use async_trait::async_trait;
use gvd_core::{DependencyKind, ReleaseAsset, ReleaseInfo, ReleaseSource, ReleaseSourceError};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Public GitHub API root.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// GitHub API response for a release
#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    published_at: Option<String>,
    #[serde(default)]
    assets: Vec<GitHubAsset>,
}

/// GitHub API response for a release asset
#[derive(Debug, Deserialize)]
struct GitHubAsset {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    size: u64,
}

impl From<GitHubRelease> for ReleaseInfo {
    fn from(release: GitHubRelease) -> Self {
        Self {
            tag_name: release.tag_name,
            published_at: release.published_at,
            assets: release
                .assets
                .into_iter()
                .map(|a| ReleaseAsset {
                    name: a.name,
                    download_url: a.browser_download_url,
                    size: a.size,
                })
                .collect(),
        }
    }
}

/// Fetches `releases/latest` for each tool's upstream repository.
#[derive(Debug, Clone)]
pub struct GitHubReleaseSource {
    client: Client,
    api_base: String,
    user_agent: String,
}

impl GitHubReleaseSource {
    pub fn new(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            api_base: DEFAULT_GITHUB_API.to_string(),
            user_agent: user_agent.into(),
        }
    }

    /// Point at another API root (mirrors, tests).
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Upstream `owner/repo` for a tool.
    pub const fn repository(kind: DependencyKind) -> &'static str {
        match kind {
            DependencyKind::YtDlp => "yt-dlp/yt-dlp",
            DependencyKind::Ffmpeg => "BtbN/FFmpeg-Builds",
        }
    }

    fn latest_url(&self, kind: DependencyKind) -> String {
        format!("{}/repos/{}/releases/latest", self.api_base, Self::repository(kind))
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleaseSource {
    async fn latest_release(&self, kind: DependencyKind) -> Result<ReleaseInfo, ReleaseSourceError> {
        let url = self.latest_url(kind);
        debug!(dependency = kind.name(), %url, "Fetching latest release");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(|e| ReleaseSourceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ReleaseSourceError::Status(response.status().as_u16()));
        }

        let release: GitHubRelease = response
            .json()
            .await
            .map_err(|e| ReleaseSourceError::Malformed(e.to_string()))?;
        Ok(release.into())
    }
}
