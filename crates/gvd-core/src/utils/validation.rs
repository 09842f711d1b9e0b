//! Job input validation.
//!
//! Everything here runs before a process is spawned. A failure is reported
//! once, to the caller, and nothing is started.

use thiserror::Error;
use url::Url;

use crate::domain::{JobOptions, TimeRange};

/// Rejected job input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a video URL.")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Please choose a destination folder.")]
    EmptyDestination,

    #[error("Invalid timestamp '{0}' (expected SS, MM:SS or HH:MM:SS)")]
    InvalidTimestamp(String),

    #[error("Section start {start} must be before end {end}")]
    InvertedRange { start: String, end: String },

    #[error("Section needs both a start and an end time")]
    IncompleteRange,

    #[error("Unknown cookie browser: {0}")]
    UnknownCookieSource(String),

    #[error("Extra argument must be a single line without NUL bytes")]
    InvalidExtraArg,
}

/// Check a URL is absolute http(s) with a host.
pub fn validate_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingUrl);
    }

    let parsed = Url::parse(trimmed).map_err(|_| ValidationError::InvalidUrl(trimmed.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::InvalidUrl(trimmed.to_string()));
    }
    Ok(parsed)
}

/// Validate everything about a job that can be checked offline.
pub fn validate_job_options(options: &JobOptions) -> Result<(), ValidationError> {
    validate_url(&options.url)?;

    if options.destination.as_os_str().is_empty()
        || options.destination.to_string_lossy().trim().is_empty()
    {
        return Err(ValidationError::EmptyDestination);
    }

    if let Some(ref section) = options.section {
        TimeRange::new(section.start(), section.end())?;
    }

    if let Some(ref arg) = options.extra_arg {
        if arg.contains(['\0', '\n', '\r']) {
            return Err(ValidationError::InvalidExtraArg);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url() {
        let options = JobOptions::new("   ", "/tmp");
        assert_eq!(validate_job_options(&options), Err(ValidationError::MissingUrl));
    }

    #[test]
    fn test_invalid_urls() {
        for url in ["not a url", "ftp://example.com/file", "file:///etc/passwd", "https://"] {
            let options = JobOptions::new(url, "/tmp");
            assert!(
                matches!(validate_job_options(&options), Err(ValidationError::InvalidUrl(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_destination() {
        let options = JobOptions::new("https://example.com/watch?v=abc", "");
        assert_eq!(
            validate_job_options(&options),
            Err(ValidationError::EmptyDestination)
        );
    }

    #[test]
    fn test_extra_arg_with_newline_is_rejected() {
        let options = JobOptions::new("https://example.com/v", "/tmp")
            .with_extra_arg(Some("--embed-thumbnail\n--exec rm"));
        assert_eq!(
            validate_job_options(&options),
            Err(ValidationError::InvalidExtraArg)
        );
    }

    #[test]
    fn test_inverted_section_in_stored_options_is_rejected() {
        let options = JobOptions::new("https://example.com/watch?v=abc", "/tmp");
        let mut value = serde_json::to_value(&options).unwrap();
        value["section"] = serde_json::json!({"start": "00:10", "end": "00:05"});

        assert!(serde_json::from_value::<JobOptions>(value).is_err());
    }

    #[test]
    fn test_valid_section_passes() {
        let options = JobOptions::new("https://example.com/v", "/tmp")
            .with_section(Some(TimeRange::new("00:01:00", "00:02:30").unwrap()));
        assert!(validate_job_options(&options).is_ok());
    }

    #[test]
    fn test_valid_options() {
        let options = JobOptions::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "/tmp")
            .with_extra_arg(Some("--embed-thumbnail"));
        assert!(validate_job_options(&options).is_ok());
    }
}
