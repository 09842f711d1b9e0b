//! Settings domain types, validation and JSON persistence.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::CookieSource;

/// URL probed before a job starts when no override is configured.
pub const DEFAULT_CONNECTIVITY_URL: &str = "https://www.google.com";

/// Seconds to wait for the connectivity probe.
pub const DEFAULT_CONNECTIVITY_TIMEOUT_SECS: u64 = 5;

/// User agent sent to the release source and file hosts.
pub const DEFAULT_USER_AGENT: &str = concat!("gvd/", env!("CARGO_PKG_VERSION"));

/// Application settings structure.
///
/// All fields are optional to support partial updates and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory media is written to when none is given.
    pub default_download_path: Option<String>,

    /// Browser cookie store (`none`, `firefox`, ...).
    pub cookies_browser: Option<String>,

    pub default_audio_format: Option<String>,
    pub default_audio_quality: Option<String>,
    pub default_video_format: Option<String>,
    pub default_video_quality: Option<String>,

    /// Pass `--geo-bypass` to the fetch tool.
    pub geo_bypass: Option<bool>,

    /// Pass `--ignore-errors` to the fetch tool.
    pub ignore_errors: Option<bool>,

    /// URL requested by the pre-job connectivity check.
    pub connectivity_url: Option<String>,

    pub connectivity_timeout_secs: Option<u64>,

    pub user_agent: Option<String>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            default_download_path: None,
            cookies_browser: Some("none".to_string()),
            default_audio_format: Some("mp3".to_string()),
            default_audio_quality: Some("default".to_string()),
            default_video_format: Some("mp4".to_string()),
            default_video_quality: Some("default".to_string()),
            geo_bypass: Some(false),
            ignore_errors: Some(false),
            connectivity_url: Some(DEFAULT_CONNECTIVITY_URL.to_string()),
            connectivity_timeout_secs: Some(DEFAULT_CONNECTIVITY_TIMEOUT_SECS),
            user_agent: None,
        }
    }

    /// Cookie source with fallback to `none` on missing or unknown values.
    pub fn effective_cookies(&self) -> CookieSource {
        self.cookies_browser
            .as_deref()
            .and_then(|raw| CookieSource::from_str(raw).ok())
            .unwrap_or_default()
    }

    pub fn effective_connectivity_url(&self) -> &str {
        self.connectivity_url
            .as_deref()
            .unwrap_or(DEFAULT_CONNECTIVITY_URL)
    }

    pub fn effective_connectivity_timeout_secs(&self) -> u64 {
        self.connectivity_timeout_secs
            .unwrap_or(DEFAULT_CONNECTIVITY_TIMEOUT_SECS)
    }

    pub fn effective_user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Merge another settings into this one, only updating fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref path) = other.default_download_path {
            self.default_download_path.clone_from(path);
        }
        if let Some(ref browser) = other.cookies_browser {
            self.cookies_browser.clone_from(browser);
        }
        if let Some(ref format) = other.default_audio_format {
            self.default_audio_format.clone_from(format);
        }
        if let Some(ref quality) = other.default_audio_quality {
            self.default_audio_quality.clone_from(quality);
        }
        if let Some(ref format) = other.default_video_format {
            self.default_video_format.clone_from(format);
        }
        if let Some(ref quality) = other.default_video_quality {
            self.default_video_quality.clone_from(quality);
        }
        if let Some(flag) = other.geo_bypass {
            self.geo_bypass = flag;
        }
        if let Some(flag) = other.ignore_errors {
            self.ignore_errors = flag;
        }
        if let Some(ref url) = other.connectivity_url {
            self.connectivity_url.clone_from(url);
        }
        if let Some(secs) = other.connectivity_timeout_secs {
            self.connectivity_timeout_secs = secs;
        }
        if let Some(ref agent) = other.user_agent {
            self.user_agent.clone_from(agent);
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = set field to None/null
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub default_download_path: Option<Option<String>>,
    pub cookies_browser: Option<Option<String>>,
    pub default_audio_format: Option<Option<String>>,
    pub default_audio_quality: Option<Option<String>>,
    pub default_video_format: Option<Option<String>>,
    pub default_video_quality: Option<Option<String>>,
    pub geo_bypass: Option<Option<bool>>,
    pub ignore_errors: Option<Option<bool>>,
    pub connectivity_url: Option<Option<String>>,
    pub connectivity_timeout_secs: Option<Option<u64>>,
    pub user_agent: Option<Option<String>>,
}

/// Settings validation and persistence error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Download path cannot be empty")]
    EmptyDownloadPath,

    #[error("Unknown cookie browser: {0}")]
    UnknownCookieBrowser(String),

    #[error("Connectivity timeout must be at least 1 second")]
    ZeroTimeout,

    #[error("Connectivity URL is not a valid http(s) URL: {0}")]
    InvalidConnectivityUrl(String),

    #[error("Failed to read or write settings file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Settings file is not valid JSON: {0}")]
    Parse(String),
}

pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings
        .default_download_path
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyDownloadPath);
    }

    if let Some(ref browser) = settings.cookies_browser {
        if CookieSource::from_str(browser).is_err() {
            return Err(SettingsError::UnknownCookieBrowser(browser.clone()));
        }
    }

    if settings.connectivity_timeout_secs == Some(0) {
        return Err(SettingsError::ZeroTimeout);
    }

    if let Some(ref raw) = settings.connectivity_url {
        let valid = url::Url::parse(raw)
            .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some());
        if !valid {
            return Err(SettingsError::InvalidConnectivityUrl(raw.clone()));
        }
    }

    Ok(())
}

/// Load settings from `path`, returning defaults when the file is absent.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No settings file, using defaults");
        return Ok(Settings::with_defaults());
    }

    let raw = fs::read_to_string(path).map_err(|e| SettingsError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| SettingsError::Parse(e.to_string()))
}

/// Validate and write settings to `path` atomically.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    validate_settings(settings)?;

    let io_err = |e: std::io::Error| SettingsError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json =
        serde_json::to_string_pretty(settings).map_err(|e| SettingsError::Parse(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
