//! Media job option types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::validation::ValidationError;

/// Unique identifier of one media job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Allocate a fresh job id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize a user-facing selector value.
///
/// Empty strings and `default` (any case) mean "let the tool decide" and map
/// to `None`; everything else is trimmed and kept.
pub fn selector(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("default") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Browser whose cookie store the fetch tool should read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieSource {
    #[default]
    None,
    Brave,
    Chrome,
    Chromium,
    Edge,
    Firefox,
    Opera,
    Safari,
    Vivaldi,
    Whale,
}

impl CookieSource {
    /// All accepted values, in display order.
    pub const ALL: [Self; 10] = [
        Self::None,
        Self::Brave,
        Self::Chrome,
        Self::Chromium,
        Self::Edge,
        Self::Firefox,
        Self::Opera,
        Self::Safari,
        Self::Vivaldi,
        Self::Whale,
    ];

    /// Name passed to `--cookies-from-browser`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Brave => "brave",
            Self::Chrome => "chrome",
            Self::Chromium => "chromium",
            Self::Edge => "edge",
            Self::Firefox => "firefox",
            Self::Opera => "opera",
            Self::Safari => "safari",
            Self::Vivaldi => "vivaldi",
            Self::Whale => "whale",
        }
    }

    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for CookieSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CookieSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.is_empty() {
            return Ok(Self::None);
        }
        Self::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownCookieSource(wanted.to_string()))
    }
}

/// Subtitle download behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "languages", rename_all = "snake_case")]
pub enum SubtitleMode {
    /// No subtitles.
    #[default]
    None,
    /// Automatically generated subtitles in the default language.
    Auto,
    /// Uploaded subtitles for a comma-separated language list.
    Languages(String),
    /// Live chat replay of a stream.
    LiveChat,
}

/// Validated start/end window of the source media.
///
/// Bounds are clock timestamps (`SS`, `MM:SS` or `HH:MM:SS`, optional
/// fractional seconds). Construction fails unless `start < end`, and
/// deserialization goes through the same check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRange", into = "RawRange")]
pub struct TimeRange {
    start: String,
    end: String,
}

#[derive(Serialize, Deserialize)]
struct RawRange {
    start: String,
    end: String,
}

impl TryFrom<RawRange> for TimeRange {
    type Error = ValidationError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        Self::new(&raw.start, &raw.end)
    }
}

impl From<TimeRange> for RawRange {
    fn from(range: TimeRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

impl TimeRange {
    /// Build a range from two clock timestamps.
    pub fn new(start: &str, end: &str) -> Result<Self, ValidationError> {
        let start = start.trim();
        let end = end.trim();
        let start_secs = parse_clock(start)?;
        let end_secs = parse_clock(end)?;

        if start_secs >= end_secs {
            return Err(ValidationError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(Self {
            start: start.to_string(),
            end: end.to_string(),
        })
    }

    /// Build a range from optional bounds as they arrive from a form.
    ///
    /// Both absent (or blank) yields `Ok(None)`; exactly one present is an error.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>, ValidationError> {
        let start = start.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());

        match (start, end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => Self::new(start, end).map(Some),
            _ => Err(ValidationError::IncompleteRange),
        }
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    /// Value for `--download-sections`.
    pub fn section_arg(&self) -> String {
        format!("*{}-{}", self.start, self.end)
    }
}

fn parse_clock(raw: &str) -> Result<f64, ValidationError> {
    let invalid = || ValidationError::InvalidTimestamp(raw.to_string());

    let parts: Vec<&str> = raw.split(':').collect();
    if raw.is_empty() || parts.len() > 3 {
        return Err(invalid());
    }

    let (last, leading) = parts.split_last().ok_or_else(invalid)?;
    let mut total = 0.0_f64;
    for part in leading {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: u32 = part.parse().map_err(|_| invalid())?;
        total = total.mul_add(60.0, f64::from(value));
    }

    if last.is_empty() || !last.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid());
    }
    let seconds: f64 = last.parse().map_err(|_| invalid())?;
    if !leading.is_empty() && seconds >= 60.0 {
        return Err(invalid());
    }

    Ok(total.mul_add(60.0, seconds))
}

/// Options for one media fetch job.
///
/// Selector fields use `None` for "default" (the tool picks). Construct with
/// [`JobOptions::new`] and the `with_*` builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Media page URL.
    pub url: String,
    /// Directory the tool writes into.
    pub destination: PathBuf,
    /// Browser cookie store to read, if any.
    pub cookies: CookieSource,
    /// Extract audio only.
    pub audio_only: bool,
    /// Audio container (`mp3`, `m4a`, ...).
    pub audio_format: Option<String>,
    /// Audio bitrate in human units (`320kbps`).
    pub audio_quality: Option<String>,
    /// Merge container for video mode (`mp4`, `mkv`, ...).
    pub video_format: Option<String>,
    /// Vertical resolution in human units (`1080p`).
    pub video_quality: Option<String>,
    /// Portion of the media to fetch.
    pub section: Option<TimeRange>,
    /// Single opaque argument passed through unchanged.
    pub extra_arg: Option<String>,
    pub subtitles: SubtitleMode,
    pub geo_bypass: bool,
    pub ignore_errors: bool,
}

impl JobOptions {
    /// Create options for a URL and destination with every selector at default.
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            cookies: CookieSource::None,
            audio_only: false,
            audio_format: None,
            audio_quality: None,
            video_format: None,
            video_quality: None,
            section: None,
            extra_arg: None,
            subtitles: SubtitleMode::None,
            geo_bypass: false,
            ignore_errors: false,
        }
    }

    #[must_use]
    pub const fn with_cookies(mut self, cookies: CookieSource) -> Self {
        self.cookies = cookies;
        self
    }

    /// Switch to audio extraction with the given format and quality selectors.
    #[must_use]
    pub fn audio_only(mut self, format: &str, quality: &str) -> Self {
        self.audio_only = true;
        self.audio_format = selector(format);
        self.audio_quality = selector(quality);
        self
    }

    /// Set the video format and quality selectors.
    #[must_use]
    pub fn with_video(mut self, format: &str, quality: &str) -> Self {
        self.video_format = selector(format);
        self.video_quality = selector(quality);
        self
    }

    #[must_use]
    pub fn with_section(mut self, section: Option<TimeRange>) -> Self {
        self.section = section;
        self
    }

    /// Set the pass-through argument; blank input clears it.
    #[must_use]
    pub fn with_extra_arg(mut self, arg: Option<&str>) -> Self {
        self.extra_arg = arg.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        self
    }

    #[must_use]
    pub fn with_subtitles(mut self, subtitles: SubtitleMode) -> Self {
        self.subtitles = subtitles;
        self
    }

    #[must_use]
    pub const fn with_geo_bypass(mut self, enabled: bool) -> Self {
        self.geo_bypass = enabled;
        self
    }

    #[must_use]
    pub const fn with_ignore_errors(mut self, enabled: bool) -> Self {
        self.ignore_errors = enabled;
        self
    }
}
