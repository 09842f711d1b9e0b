//! Progress line classification for the fetch tool's output.
//!
//! Stateless. A line counts as progress when it carries the `[download]`
//! marker and a `%` sign; the percent is the last whitespace-separated token
//! before the first `%`. Anything that does not parse yields `None`.

/// Marker the fetch tool prefixes to transfer progress lines.
pub const PROGRESS_MARKER: &str = "[download]";

/// One classified progress line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Percent complete, 0 to 100.
    pub percent: f64,
    /// Remaining time as printed by the tool (`00:05`, `01:02:03`).
    pub eta: Option<String>,
}

/// Extract a progress update from one output line.
pub fn parse_line(line: &str) -> Option<ProgressUpdate> {
    parse_percent(line).map(|percent| ProgressUpdate {
        percent,
        eta: parse_eta(line),
    })
}

/// Extract the percent value from a progress line.
pub fn parse_percent(line: &str) -> Option<f64> {
    if !line.contains(PROGRESS_MARKER) {
        return None;
    }
    let (before, _) = line.split_once('%')?;
    let token = before.split_whitespace().last()?;
    token
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && (0.0..=100.0).contains(p))
}

/// Extract the `ETA <time>` token, ignoring `Unknown`.
pub fn parse_eta(line: &str) -> Option<String> {
    let (_, after) = line.rsplit_once("ETA")?;
    let token = after.split_whitespace().next()?;
    if token.eq_ignore_ascii_case("unknown") || token.eq_ignore_ascii_case("n/a") {
        return None;
    }
    token
        .chars()
        .all(|c| c.is_ascii_digit() || c == ':')
        .then(|| token.to_string())
}
