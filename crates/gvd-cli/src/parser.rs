//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Download video and audio with yt-dlp and ffmpeg managed for you.
#[derive(Parser)]
#[command(name = "gvd")]
#[command(about = "Fetch media with managed yt-dlp and ffmpeg")]
#[command(version)]
pub struct Cli {
    /// Override the data directory for this invocation
    #[arg(long = "data-dir", global = true, env = "GVD_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
