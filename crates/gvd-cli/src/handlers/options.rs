//! Turning `fetch` arguments and saved settings into [`JobOptions`].

use std::path::PathBuf;

use gvd_core::{CookieSource, JobOptions, Settings, SubtitleMode, TimeRange};

use crate::commands::FetchArgs;
use crate::error::CliError;

/// Merge arguments over settings over built-in defaults.
pub fn build_options(args: &FetchArgs, settings: &Settings) -> Result<JobOptions, CliError> {
    let destination = match (&args.output, &settings.default_download_path) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dir)) => PathBuf::from(dir),
        (None, None) => std::env::current_dir()?,
    };

    let cookies = match args.cookies.as_deref() {
        Some(raw) => raw.parse::<CookieSource>()?,
        None => settings.effective_cookies(),
    };

    let mut options = JobOptions::new(args.url.trim(), destination)
        .with_cookies(cookies)
        .with_section(TimeRange::from_bounds(args.start.as_deref(), args.end.as_deref())?)
        .with_subtitles(subtitles(args))
        .with_extra_arg(args.extra_arg.as_deref())
        .with_geo_bypass(args.geo_bypass || settings.geo_bypass.unwrap_or(false))
        .with_ignore_errors(args.ignore_errors || settings.ignore_errors.unwrap_or(false));

    options = if args.audio {
        options.audio_only(
            pick(args.audio_format.as_ref(), settings.default_audio_format.as_ref(), "mp3"),
            pick(args.audio_quality.as_ref(), settings.default_audio_quality.as_ref(), "default"),
        )
    } else {
        options.with_video(
            pick(args.video_format.as_ref(), settings.default_video_format.as_ref(), "mp4"),
            pick(args.video_quality.as_ref(), settings.default_video_quality.as_ref(), "default"),
        )
    };

    Ok(options)
}

fn subtitles(args: &FetchArgs) -> SubtitleMode {
    if args.live_chat {
        SubtitleMode::LiveChat
    } else if args.auto_subs {
        SubtitleMode::Auto
    } else {
        args.sub_langs
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map_or(SubtitleMode::None, |l| SubtitleMode::Languages(l.to_string()))
    }
}

fn pick<'a>(arg: Option<&'a String>, saved: Option<&'a String>, fallback: &'a str) -> &'a str {
    arg.or(saved).map_or(fallback, String::as_str)
}
