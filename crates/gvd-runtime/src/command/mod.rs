//! Argument vector construction for the media fetch tool.
//!
//! Pure and deterministic: identical options always yield an identical
//! vector. No validation happens here; a degenerate option set yields a
//! degenerate vector.
//!
//! Emission order:
//! 1. `--newline --no-playlist -P <dest> --ffmpeg-location <path>`
//! 2. cookie source, then `--geo-bypass` / `--ignore-errors`
//! 3. `--download-sections "*from-to" --force-keyframes-at-cuts`
//! 4. audio block (`-x ...`) or video block (`-S res:N ...`)
//! 5. subtitle flags
//! 6. extra argument as one token
//! 7. URL

mod preview;

use std::path::Path;

use gvd_core::{JobOptions, SubtitleMode};

pub use preview::{render_command, shell_quote};

/// Build the fetch tool arguments for `options`.
pub fn build_args(options: &JobOptions, ffmpeg_location: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--newline".into(),
        "--no-playlist".into(),
        "-P".into(),
        options.destination.display().to_string(),
        "--ffmpeg-location".into(),
        ffmpeg_location.display().to_string(),
    ];

    if !options.cookies.is_none() {
        args.push("--cookies-from-browser".into());
        args.push(options.cookies.as_str().into());
    }
    if options.geo_bypass {
        args.push("--geo-bypass".into());
    }
    if options.ignore_errors {
        args.push("--ignore-errors".into());
    }

    if let Some(ref section) = options.section {
        args.push("--download-sections".into());
        args.push(section.section_arg());
        args.push("--force-keyframes-at-cuts".into());
    }

    if options.audio_only {
        args.push("-x".into());
        if let Some(ref format) = options.audio_format {
            args.push("--audio-format".into());
            args.push(format.to_lowercase());
        }
        if let Some(ref quality) = options.audio_quality {
            args.push("--audio-quality".into());
            args.push(audio_quality_arg(quality));
        }
    } else {
        if let Some(ref quality) = options.video_quality {
            args.push("-S".into());
            args.push(format!("res:{}", resolution_arg(quality)));
        }
        if let Some(ref format) = options.video_format {
            args.push("--merge-output-format".into());
            args.push(format.to_lowercase());
        }
    }

    match options.subtitles {
        SubtitleMode::None => {}
        SubtitleMode::Auto => args.push("--write-auto-subs".into()),
        SubtitleMode::Languages(ref langs) => {
            args.push("--write-subs".into());
            args.push("--sub-langs".into());
            args.push(langs.trim().to_string());
        }
        SubtitleMode::LiveChat => {
            args.push("--write-subs".into());
            args.push("--sub-langs".into());
            args.push("live_chat".into());
        }
    }

    if let Some(ref extra) = options.extra_arg {
        if !extra.is_empty() {
            args.push(extra.clone());
        }
    }

    let url = options.url.trim();
    if !url.is_empty() {
        args.push(url.to_string());
    }

    args
}

/// `320kbps` → `320K`; other values pass through (`0`..`10` VBR levels).
fn audio_quality_arg(quality: &str) -> String {
    let trimmed = quality.trim();
    let lower = trimmed.to_ascii_lowercase();
    lower.strip_suffix("kbps").map_or_else(
        || trimmed.to_string(),
        |digits| format!("{}K", digits.trim()),
    )
}

/// `1080p` → `1080`.
fn resolution_arg(quality: &str) -> String {
    let trimmed = quality.trim();
    trimmed
        .strip_suffix(['p', 'P'])
        .unwrap_or(trimmed)
        .to_string()
}

/// Arguments for a title lookup that downloads nothing.
pub fn title_args(url: &str) -> Vec<String> {
    vec![
        "--no-playlist".into(),
        "--print".into(),
        "title".into(),
        "--skip-download".into(),
        url.trim().to_string(),
    ]
}
