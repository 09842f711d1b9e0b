//! Paths command handler.
//!
//! Displays every resolved path in `key = value` form for diagnosing
//! where tools and settings live.

use crate::bootstrap::CliContext;

pub fn execute(ctx: &CliContext) {
    let config = &ctx.config;
    println!("data_root = {}", config.data_root.display());
    println!("requirements_dir = {}", config.requirements_dir.display());
    println!("versions_file = {}", config.versions_path.display());
    println!("settings_file = {}", config.config_path.display());
    println!("queue_file = {}", config.queue_path.display());
    println!("yt_dlp = {}", ctx.jobs().tools().fetch_tool.display());
    println!("ffmpeg = {}", ctx.jobs().tools().ffmpeg.display());
}
