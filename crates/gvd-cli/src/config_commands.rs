//! Settings subcommands.

use clap::Subcommand;

/// `gvd config` commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show all current settings
    Show {
        /// Print the raw settings file contents as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update settings; only the given options change
    Set {
        /// Default directory for downloads
        #[arg(long)]
        download_path: Option<String>,
        /// Browser to read cookies from (or "none")
        #[arg(long)]
        cookies: Option<String>,
        /// Default audio format
        #[arg(long)]
        audio_format: Option<String>,
        /// Default audio bitrate, e.g. 320kbps
        #[arg(long)]
        audio_quality: Option<String>,
        /// Default merge container for video
        #[arg(long)]
        video_format: Option<String>,
        /// Default maximum resolution, e.g. 1080p
        #[arg(long)]
        video_quality: Option<String>,
        /// Always bypass geographic restrictions
        #[arg(long)]
        geo_bypass: Option<bool>,
        /// Always continue past download errors
        #[arg(long)]
        ignore_errors: Option<bool>,
        /// URL requested before each download to check connectivity
        #[arg(long)]
        connectivity_url: Option<String>,
        /// Connectivity check timeout in seconds
        #[arg(long)]
        connectivity_timeout: Option<u64>,
        /// User-Agent for release lookups and downloads
        #[arg(long)]
        user_agent: Option<String>,
    },

    /// Reset all settings to defaults
    Reset,
}
