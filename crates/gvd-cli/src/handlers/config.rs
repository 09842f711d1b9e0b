//! Config command handler.

use gvd_core::{Settings, SettingsUpdate, load_settings, save_settings};

use crate::bootstrap::CliContext;
use crate::config_commands::ConfigCommand;
use crate::error::CliError;
use crate::presentation::format_optional;

pub fn execute(ctx: &CliContext, command: ConfigCommand) -> Result<(), CliError> {
    let path = &ctx.config.config_path;
    match command {
        ConfigCommand::Show { json } => {
            let settings = load_settings(path)?;
            if json {
                let rendered = serde_json::to_string_pretty(&settings)
                    .map_err(|e| CliError::Config(e.to_string()))?;
                println!("{rendered}");
            } else {
                show(&settings);
            }
            Ok(())
        }
        ConfigCommand::Set {
            download_path,
            cookies,
            audio_format,
            audio_quality,
            video_format,
            video_quality,
            geo_bypass,
            ignore_errors,
            connectivity_url,
            connectivity_timeout,
            user_agent,
        } => {
            let update = SettingsUpdate {
                default_download_path: download_path.map(Some),
                cookies_browser: cookies.map(|c| Some(c.trim().to_lowercase())),
                default_audio_format: audio_format.map(Some),
                default_audio_quality: audio_quality.map(Some),
                default_video_format: video_format.map(Some),
                default_video_quality: video_quality.map(Some),
                geo_bypass: geo_bypass.map(Some),
                ignore_errors: ignore_errors.map(Some),
                connectivity_url: connectivity_url.map(Some),
                connectivity_timeout_secs: connectivity_timeout.map(Some),
                user_agent: user_agent.map(Some),
            };
            let settings = apply_update(load_settings(path)?, &update);
            save_settings(path, &settings)?;
            println!("✓ Settings saved to {}", path.display());
            show(&settings);
            Ok(())
        }
        ConfigCommand::Reset => {
            save_settings(path, &Settings::with_defaults())?;
            println!("✓ Settings reset to defaults.");
            Ok(())
        }
    }
}

/// Merge an update into loaded settings.
pub fn apply_update(mut settings: Settings, update: &SettingsUpdate) -> Settings {
    settings.merge(update);
    settings
}

fn show(settings: &Settings) {
    let rows = [
        ("download_path", format_optional(settings.default_download_path.as_ref(), "(current directory)")),
        ("cookies", settings.effective_cookies().to_string()),
        ("audio_format", format_optional(settings.default_audio_format.as_ref(), "mp3")),
        ("audio_quality", format_optional(settings.default_audio_quality.as_ref(), "default")),
        ("video_format", format_optional(settings.default_video_format.as_ref(), "mp4")),
        ("video_quality", format_optional(settings.default_video_quality.as_ref(), "default")),
        ("geo_bypass", settings.geo_bypass.unwrap_or(false).to_string()),
        ("ignore_errors", settings.ignore_errors.unwrap_or(false).to_string()),
        ("connectivity_url", settings.effective_connectivity_url().to_string()),
        (
            "connectivity_timeout",
            format!("{}s", settings.effective_connectivity_timeout_secs()),
        ),
        ("user_agent", settings.effective_user_agent().to_string()),
    ];
    for (key, value) in rows {
        println!("{key} = {value}");
    }
}
