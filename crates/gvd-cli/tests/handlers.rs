//! Handler behaviour against a throwaway data root.

use gvd_cli::handlers::{config, deps, fetch, options, preview, queue};
use gvd_cli::{CliConfig, CliError, ConfigCommand, DepsCommand, FetchArgs, QueueCommand, bootstrap};
use gvd_core::{CookieSource, QueueStatus, load_settings};
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

fn set_command(cookies: Option<&str>, quality: Option<&str>) -> ConfigCommand {
    ConfigCommand::Set {
        download_path: None,
        cookies: cookies.map(String::from),
        audio_format: None,
        audio_quality: None,
        video_format: None,
        video_quality: quality.map(String::from),
        geo_bypass: Some(true),
        ignore_errors: None,
        connectivity_url: None,
        connectivity_timeout: None,
        user_agent: None,
    }
}

fn fetch_args(url: &str, dir: &TempDir) -> FetchArgs {
    FetchArgs {
        url: url.to_string(),
        output: Some(dir.path().join("media")),
        ..FetchArgs::default()
    }
}

#[test]
fn test_config_set_persists_and_reset_restores() {
    let dir = TempDir::new().unwrap();
    let ctx = bootstrap(CliConfig::for_root(dir.path())).unwrap();

    assert_ok!(config::execute(&ctx, set_command(Some("Firefox"), Some("1080p"))));
    let saved = load_settings(&ctx.config.config_path).unwrap();
    assert_eq!(saved.effective_cookies(), CookieSource::Firefox);
    assert_eq!(saved.default_video_quality.as_deref(), Some("1080p"));
    assert_eq!(saved.geo_bypass, Some(true));

    assert_ok!(config::execute(&ctx, ConfigCommand::Reset));
    let reset = load_settings(&ctx.config.config_path).unwrap();
    assert_eq!(reset, gvd_core::Settings::with_defaults());
}

#[test]
fn test_config_set_rejects_unknown_browser() {
    let dir = TempDir::new().unwrap();
    let ctx = bootstrap(CliConfig::for_root(dir.path())).unwrap();

    let err = assert_err!(config::execute(&ctx, set_command(Some("netscape"), None)));
    assert!(matches!(err, CliError::Config(_)));
    assert!(!ctx.config.config_path.exists());
}

#[test]
fn test_preview_validates_url() {
    let dir = TempDir::new().unwrap();
    let ctx = bootstrap(CliConfig::for_root(dir.path())).unwrap();

    assert_ok!(preview::execute(&ctx, &fetch_args("https://example.com/v", &dir)));
    let err = assert_err!(preview::execute(&ctx, &fetch_args("ftp://example.com/v", &dir)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_preview_matches_controller_args() {
    let dir = TempDir::new().unwrap();
    let ctx = bootstrap(CliConfig::for_root(dir.path())).unwrap();

    let mut args = fetch_args("https://example.com/v", &dir);
    args.audio = true;
    let built = options::build_options(&args, &ctx.settings).unwrap();
    let command = ctx.jobs().command_args(&built);
    assert!(command.contains(&"-x".to_string()));
    assert!(command.contains(&"--audio-format".to_string()));
    assert_eq!(command.last().map(String::as_str), Some("https://example.com/v"));
}

#[tokio::test]
async fn test_fetch_without_tools_reports_missing() {
    let dir = TempDir::new().unwrap();
    let ctx = bootstrap(CliConfig::for_root(dir.path())).unwrap();

    let err = assert_err!(fetch::execute(&ctx, &fetch_args("https://example.com/v", &dir)).await);
    match err {
        CliError::Dependency(message) => {
            assert!(message.contains("yt-dlp"));
            assert!(message.contains("ffmpeg"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!ctx.jobs().is_active());
}

#[tokio::test]
async fn test_deps_status_and_check_without_tools() {
    let dir = TempDir::new().unwrap();
    let ctx = bootstrap(CliConfig::for_root(dir.path())).unwrap();

    assert_ok!(deps::execute(&ctx, DepsCommand::Status).await);
    // Not installed is reported, not treated as an error, and needs no network
    assert_ok!(deps::execute(&ctx, DepsCommand::Check { name: None }).await);

    let err = assert_err!(
        deps::execute(
            &ctx,
            DepsCommand::Check {
                name: Some("aria2c".to_string())
            }
        )
        .await
    );
    assert!(matches!(err, CliError::Arguments(_)));
}

#[tokio::test]
async fn test_queue_add_list_remove_persist() {
    let dir = TempDir::new().unwrap();
    let ctx = bootstrap(CliConfig::for_root(dir.path())).unwrap();

    let add = QueueCommand::Add {
        fetch: fetch_args("https://example.com/v", &dir),
        title: Some("Keynote".to_string()),
    };
    assert_ok!(queue::execute(&ctx, add).await);
    assert_ok!(queue::execute(&ctx, QueueCommand::List { json: true }).await);

    // A second context over the same root sees the saved entry
    let reopened = bootstrap(CliConfig::for_root(dir.path())).unwrap();
    let items = reopened.queue().items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Keynote");
    assert_eq!(items[0].status, QueueStatus::Queued);

    let remove = QueueCommand::Remove {
        id: items[0].id.to_string(),
    };
    assert_ok!(queue::execute(&reopened, remove).await);
    assert!(reopened.queue().is_empty());
}

#[tokio::test]
async fn test_queue_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let ctx = bootstrap(CliConfig::for_root(dir.path())).unwrap();

    let err = assert_err!(
        queue::execute(&ctx, QueueCommand::Remove { id: "nope".to_string() }).await
    );
    assert_eq!(err.exit_code(), 2);

    let add = QueueCommand::Add {
        fetch: fetch_args("ftp://example.com/v", &dir),
        title: Some("x".to_string()),
    };
    let err = assert_err!(queue::execute(&ctx, add).await);
    assert_eq!(err.exit_code(), 2);
    assert!(ctx.queue().is_empty());
}

#[tokio::test]
async fn test_queue_run_without_tools_reports_missing() {
    let dir = TempDir::new().unwrap();
    let ctx = bootstrap(CliConfig::for_root(dir.path())).unwrap();

    // Empty queue has nothing to run and needs no tools
    assert_ok!(
        queue::execute(&ctx, QueueCommand::Run { install_missing: false, quiet: true }).await
    );

    let built = options::build_options(&fetch_args("https://example.com/v", &dir), &ctx.settings).unwrap();
    assert_ok!(ctx.queue().add("", built));
    let err = assert_err!(
        queue::execute(&ctx, QueueCommand::Run { install_missing: false, quiet: true }).await
    );
    assert!(matches!(err, CliError::Dependency(_)));
    assert!(!ctx.queue().is_running());
}
