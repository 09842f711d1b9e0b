//! Tool management subcommands.

use clap::Subcommand;

/// `gvd deps` commands. A missing name means every managed tool.
#[derive(Subcommand)]
pub enum DepsCommand {
    /// Show install state and versions
    Status,

    /// Download and install a tool (yt-dlp or ffmpeg)
    Install {
        /// Tool name
        name: Option<String>,
        /// Reinstall even when already present
        #[arg(short, long)]
        force: bool,
    },

    /// Check whether newer releases exist
    Check {
        /// Tool name
        name: Option<String>,
    },

    /// Replace installed tools with the newest release
    Update {
        /// Tool name
        name: Option<String>,
    },
}
