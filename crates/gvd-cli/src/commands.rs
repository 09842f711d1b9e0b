//! Top-level command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config_commands::ConfigCommand;
use crate::deps_commands::DepsCommand;
use crate::queue_commands::QueueCommand;

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Download a video or its audio
    Fetch(FetchArgs),

    /// Print the yt-dlp command line a fetch would run, without running it
    Command(FetchArgs),

    /// Print the title of a video without downloading it
    Title {
        /// Video page URL
        url: String,
    },

    /// Queue downloads and run them one after another
    Queue {
        #[command(subcommand)]
        command: QueueCommand,
    },

    /// Manage the yt-dlp and ffmpeg installs
    Deps {
        #[command(subcommand)]
        command: DepsCommand,
    },

    /// View or change saved settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Show resolved data, tool and settings paths
    Paths,
}

/// Options shared by `fetch` and `command`.
///
/// Anything left unset falls back to saved settings, then to built-in
/// defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Video page URL
    pub url: String,

    /// Directory to save into
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Read cookies from this browser (none, brave, chrome, chromium, edge,
    /// firefox, opera, safari, vivaldi, whale)
    #[arg(long)]
    pub cookies: Option<String>,

    /// Extract audio only
    #[arg(short = 'x', long)]
    pub audio: bool,

    /// Audio format when extracting audio (mp3, m4a, opus, ...)
    #[arg(long, requires = "audio")]
    pub audio_format: Option<String>,

    /// Audio bitrate, e.g. 320kbps
    #[arg(long, requires = "audio")]
    pub audio_quality: Option<String>,

    /// Container for merged video (mp4, mkv, webm, ...)
    #[arg(long, conflicts_with = "audio")]
    pub video_format: Option<String>,

    /// Maximum resolution, e.g. 1080p
    #[arg(long, conflicts_with = "audio")]
    pub video_quality: Option<String>,

    /// Start of the section to download (SS, MM:SS or HH:MM:SS)
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// End of the section to download
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Download automatic subtitles
    #[arg(long, conflicts_with_all = ["sub_langs", "live_chat"])]
    pub auto_subs: bool,

    /// Download subtitles for these languages, e.g. "en,de"
    #[arg(long, conflicts_with = "live_chat")]
    pub sub_langs: Option<String>,

    /// Download the live chat replay
    #[arg(long)]
    pub live_chat: bool,

    /// Bypass geographic restrictions
    #[arg(long)]
    pub geo_bypass: bool,

    /// Continue past download errors
    #[arg(long)]
    pub ignore_errors: bool,

    /// One extra argument passed to yt-dlp unchanged
    #[arg(long, allow_hyphen_values = true)]
    pub extra_arg: Option<String>,

    /// Install missing tools before starting
    #[arg(long)]
    pub install_missing: bool,

    /// Hide yt-dlp output and show only the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}
