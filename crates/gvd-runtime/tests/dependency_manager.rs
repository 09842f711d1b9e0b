//! Dependency manager against a fake release source and a local file server.

mod common;

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gvd_core::{
    AppEvent, DependencyEvent, DependencyKind, DependencyState, ReleaseAsset, ReleaseInfo,
    ReleaseSource, ReleaseSourceError,
};
use gvd_runtime::deps::{AssetSelector, DependencySpec, PrebuiltAvailability};
use gvd_runtime::{ChannelEmitter, DependencyError, DependencyManager, DependencyManagerConfig, VersionStore};
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_test::{assert_err, assert_ok};

use common::{drain, local_client, serve_bytes};

const YTDLP_ASSET: &str = "yt-dlp_test";
const FFMPEG_ASSET: &str = "ffmpeg-test-build.zip";

/// Release source with a settable tag and an optional gate that holds
/// every lookup until released.
struct FakeSource {
    tag: Mutex<String>,
    base_url: String,
    gate: Option<Arc<Notify>>,
    fail: bool,
}

impl FakeSource {
    fn new(tag: &str, base_url: &str) -> Self {
        Self {
            tag: Mutex::new(tag.to_string()),
            base_url: base_url.to_string(),
            gate: None,
            fail: false,
        }
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("unused", "http://127.0.0.1:9")
        }
    }

    fn set_tag(&self, tag: &str) {
        *self.tag.lock().unwrap() = tag.to_string();
    }
}

#[async_trait]
impl ReleaseSource for FakeSource {
    async fn latest_release(&self, _kind: DependencyKind) -> Result<ReleaseInfo, ReleaseSourceError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(ReleaseSourceError::Network("connection refused".to_string()));
        }
        let asset = |name: &str| ReleaseAsset {
            name: name.to_string(),
            download_url: format!("{}/{name}", self.base_url),
            size: 0,
        };
        Ok(ReleaseInfo {
            tag_name: self.tag.lock().unwrap().clone(),
            published_at: None,
            assets: vec![asset("unrelated.txt"), asset(YTDLP_ASSET), asset(FFMPEG_ASSET)],
        })
    }
}

struct Fixture {
    dir: TempDir,
    manager: Arc<DependencyManager>,
    events: UnboundedReceiver<AppEvent>,
}

impl Fixture {
    fn tools_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("requirements")
    }

    fn versions_path(&self) -> std::path::PathBuf {
        self.dir.path().join("versions.json")
    }

    fn finished(&mut self) -> Vec<(String, bool, String)> {
        drain(&mut self.events)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Dependency(DependencyEvent::Finished { name, success, message }) => {
                    Some((name, success, message))
                }
                _ => None,
            })
            .collect()
    }
}

fn fixture(source: Arc<dyn ReleaseSource>, specs: Vec<DependencySpec>) -> Fixture {
    let dir = TempDir::new().unwrap();
    let config = DependencyManagerConfig::new(dir.path().join("requirements"), dir.path().join("versions.json"))
        .with_specs(specs);
    let (emitter, events) = ChannelEmitter::new();
    let manager = DependencyManager::new(config, source, local_client(), Arc::new(emitter));
    Fixture {
        dir,
        manager: Arc::new(manager),
        events,
    }
}

fn ytdlp_spec() -> DependencySpec {
    DependencySpec::with_selector(DependencyKind::YtDlp, AssetSelector::Exact(YTDLP_ASSET.to_string()))
}

fn ffmpeg_spec() -> DependencySpec {
    DependencySpec::with_selector(DependencyKind::Ffmpeg, AssetSelector::Suffix("-build.zip".to_string()))
}

fn ffmpeg_zip() -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        for spec_name in ffmpeg_spec().executables {
            writer
                .start_file(format!("ffmpeg-test-build/bin/{spec_name}"), options)
                .unwrap();
            writer.write_all(b"binary").unwrap();
        }
        writer.start_file("ffmpeg-test-build/LICENSE.txt", options).unwrap();
        writer.write_all(b"GPL").unwrap();
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

#[tokio::test]
async fn test_install_raw_binary_and_persist_version() {
    let base = serve_bytes(b"#!/bin/sh\necho fake\n".to_vec()).await;
    let mut fx = fixture(Arc::new(FakeSource::new("2024.03.10", &base)), vec![ytdlp_spec()]);

    assert_eq!(fx.manager.check_existing().get("yt-dlp"), Some(&false));
    assert_eq!(
        fx.manager.record("yt-dlp").unwrap().state,
        DependencyState::NotInstalled
    );

    let version = assert_ok!(fx.manager.install("yt-dlp").await);
    assert_eq!(version, "2024.03.10");

    assert_eq!(fx.manager.check_existing().get("yt-dlp"), Some(&true));
    assert!(fx.manager.ready());
    assert!(fx.tools_dir().join(gvd_core::executable_name("yt-dlp")).is_file());

    let record = fx.manager.record("yt-dlp").unwrap();
    assert_eq!(record.state, DependencyState::Installed);
    assert_eq!(record.installed_version.as_deref(), Some("2024.03.10"));

    let persisted = VersionStore::new(fx.versions_path()).load();
    let saved = persisted.get(DependencyKind::YtDlp).unwrap();
    assert_eq!(saved.installed_version.as_deref(), Some("2024.03.10"));
    assert!(saved.installed_at.is_some());

    let finished = fx.finished();
    assert_eq!(finished.len(), 1);
    assert!(finished[0].1);
    assert_eq!(finished[0].2, "Installed 2024.03.10 successfully");

    // No staging directories left behind
    let leftovers: Vec<_> = std::fs::read_dir(fx.tools_dir())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
        .collect();
    assert!(leftovers.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_installed_binary_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let base = serve_bytes(b"#!/bin/sh\n".to_vec()).await;
    let fx = fixture(Arc::new(FakeSource::new("2024.03.10", &base)), vec![ytdlp_spec()]);

    assert_ok!(fx.manager.install("yt-dlp").await);
    let mode = std::fs::metadata(fx.manager.tool_path("yt-dlp"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o111, 0o111);
}

#[tokio::test]
async fn test_install_from_zip_flattens_binaries() {
    let base = serve_bytes(ffmpeg_zip()).await;
    let mut fx = fixture(Arc::new(FakeSource::new("autobuild-2024-03-10", &base)), vec![ffmpeg_spec()]);

    assert_ok!(fx.manager.install("ffmpeg").await);

    for exe in ffmpeg_spec().executables {
        assert!(fx.tools_dir().join(&exe).is_file(), "{exe} missing");
    }
    assert!(!fx.tools_dir().join("LICENSE.txt").exists());
    assert_eq!(fx.manager.check_existing().get("ffmpeg"), Some(&true));
    assert_eq!(fx.finished().len(), 1);
}

#[tokio::test]
async fn test_progress_ends_at_zero() {
    let base = serve_bytes(vec![7u8; 64 * 1024]).await;
    let mut fx = fixture(Arc::new(FakeSource::new("2024.03.10", &base)), vec![ytdlp_spec()]);

    assert_ok!(fx.manager.install("yt-dlp").await);

    let percents: Vec<u8> = drain(&mut fx.events)
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::Dependency(DependencyEvent::Progress { percent, .. }) => Some(percent),
            _ => None,
        })
        .collect();
    assert!(percents.contains(&100));
    assert_eq!(percents.last(), Some(&0));
}

#[tokio::test]
async fn test_concurrent_install_same_tool_is_rejected() {
    let base = serve_bytes(b"#!/bin/sh\n".to_vec()).await;
    let gate = Arc::new(Notify::new());
    let source = FakeSource::new("2024.03.10", &base).gated(Arc::clone(&gate));
    let mut fx = fixture(Arc::new(source), vec![ytdlp_spec()]);

    let manager = Arc::clone(&fx.manager);
    let first = tokio::spawn(async move { manager.install("yt-dlp").await });

    tokio::time::timeout(Duration::from_secs(5), async {
        while !fx.manager.is_busy("yt-dlp") {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let err = assert_err!(fx.manager.install("yt-dlp").await);
    assert!(matches!(err, DependencyError::Busy(_)));
    assert_eq!(
        fx.manager.record("yt-dlp").unwrap().state,
        DependencyState::Installing
    );

    gate.notify_one();
    let version = assert_ok!(first.await.unwrap());
    assert_eq!(version, "2024.03.10");
    assert!(!fx.manager.is_busy("yt-dlp"));

    let finished = fx.finished();
    assert_eq!(finished.len(), 2);
    assert_eq!(finished.iter().filter(|f| f.1).count(), 1);

    let persisted = VersionStore::new(fx.versions_path()).load();
    assert_eq!(
        persisted.get(DependencyKind::YtDlp).unwrap().installed_version.as_deref(),
        Some("2024.03.10")
    );
}

#[tokio::test]
async fn test_cancel_restores_previous_state() {
    let gate = Arc::new(Notify::new());
    let source = FakeSource::new("2024.03.10", "http://127.0.0.1:9").gated(gate);
    let mut fx = fixture(Arc::new(source), vec![ytdlp_spec()]);
    fx.manager.check_existing();

    let manager = Arc::clone(&fx.manager);
    let task = tokio::spawn(async move { manager.install("yt-dlp").await });

    tokio::time::timeout(Duration::from_secs(5), async {
        while !fx.manager.is_busy("yt-dlp") {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert!(fx.manager.cancel("yt-dlp"));
    let err = assert_err!(task.await.unwrap());
    assert!(err.is_cancelled());

    assert_eq!(
        fx.manager.record("yt-dlp").unwrap().state,
        DependencyState::NotInstalled
    );
    let finished = fx.finished();
    assert_eq!(finished, [("yt-dlp".to_string(), false, "cancelled".to_string())]);
    assert!(!fx.manager.cancel("yt-dlp"));
}

#[tokio::test]
async fn test_missing_asset_fails_install() {
    let base = serve_bytes(Vec::new()).await;
    let spec = DependencySpec::with_selector(
        DependencyKind::YtDlp,
        AssetSelector::Exact("no-such-asset".to_string()),
    );
    let mut fx = fixture(Arc::new(FakeSource::new("2024.03.10", &base)), vec![spec]);

    let err = assert_err!(fx.manager.install("yt-dlp").await);
    assert!(matches!(err, DependencyError::AssetNotFound { .. }));
    assert_eq!(err.status_label(), "Asset not found");
    assert_eq!(fx.manager.record("yt-dlp").unwrap().state, DependencyState::Failed);

    let finished = fx.finished();
    assert_eq!(finished.len(), 1);
    assert!(!finished[0].1);

    assert_eq!(
        fx.manager.recover("yt-dlp").unwrap(),
        DependencyState::NotInstalled
    );
}

#[tokio::test]
async fn test_unavailable_platform_fails_without_network() {
    let spec = DependencySpec {
        kind: DependencyKind::Ffmpeg,
        executables: vec!["ffmpeg".to_string(), "ffprobe".to_string()],
        availability: PrebuiltAvailability::NotAvailable {
            reason: "no prebuilt binaries for this platform".to_string(),
        },
    };
    let mut fx = fixture(Arc::new(FakeSource::failing()), vec![spec]);

    let err = assert_err!(fx.manager.install("ffmpeg").await);
    assert!(matches!(err, DependencyError::PrebuiltNotAvailable { .. }));
    assert_eq!(fx.finished().len(), 1);
}

#[tokio::test]
async fn test_unknown_dependency() {
    let mut fx = fixture(Arc::new(FakeSource::failing()), vec![ytdlp_spec()]);

    let err = assert_err!(fx.manager.install("aria2c").await);
    assert!(matches!(err, DependencyError::UnknownDependency(_)));
    // Unknown names still get their single Finished event
    assert_eq!(fx.finished().len(), 1);
    assert!(fx.manager.record("aria2c").is_err());
}

#[tokio::test]
async fn test_failed_version_lookup_emits_info() {
    let mut fx = fixture(Arc::new(FakeSource::failing()), vec![ytdlp_spec()]);

    let latest = assert_ok!(fx.manager.fetch_latest_version("yt-dlp").await);
    assert!(latest.is_none());

    let infos: Vec<String> = drain(&mut fx.events)
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::Dependency(DependencyEvent::Info { message, .. }) => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(infos.len(), 1);
    assert!(infos[0].starts_with("Could not check for updates"));
}

#[tokio::test]
async fn test_check_update_compares_versions() {
    let base = serve_bytes(b"#!/bin/sh\n".to_vec()).await;
    let source = Arc::new(FakeSource::new("2024.03.10", &base));
    let fx = fixture(source.clone(), vec![ytdlp_spec()]);

    let err = assert_err!(fx.manager.check_update("yt-dlp").await);
    assert!(matches!(err, DependencyError::NotInstalled(_)));

    assert_ok!(fx.manager.install("yt-dlp").await);
    assert!(!assert_ok!(fx.manager.check_update("yt-dlp").await));
    assert_eq!(fx.manager.record("yt-dlp").unwrap().state, DependencyState::Installed);

    source.set_tag("2024.04.01");
    assert!(assert_ok!(fx.manager.check_update("yt-dlp").await));
    let record = fx.manager.record("yt-dlp").unwrap();
    assert_eq!(record.state, DependencyState::UpdateAvailable);
    assert_eq!(record.latest_version.as_deref(), Some("2024.04.01"));

    let version = assert_ok!(fx.manager.update("yt-dlp").await);
    assert_eq!(version, "2024.04.01");
    assert!(!assert_ok!(fx.manager.check_update("yt-dlp").await));
}

#[tokio::test]
async fn test_persisted_versions_survive_restart() {
    let base = serve_bytes(b"#!/bin/sh\n".to_vec()).await;
    let source: Arc<dyn ReleaseSource> = Arc::new(FakeSource::new("2024.03.10", &base));
    let fx = fixture(Arc::clone(&source), vec![ytdlp_spec()]);
    assert_ok!(fx.manager.install("yt-dlp").await);

    let config = DependencyManagerConfig::new(fx.tools_dir(), fx.versions_path()).with_specs(vec![ytdlp_spec()]);
    let (emitter, _rx) = ChannelEmitter::new();
    let reopened = DependencyManager::new(config, source, local_client(), Arc::new(emitter));

    let record = reopened.record("yt-dlp").unwrap();
    assert_eq!(record.installed_version.as_deref(), Some("2024.03.10"));
    assert_eq!(record.state, DependencyState::Unknown);
    assert_eq!(reopened.check_existing().get("yt-dlp"), Some(&true));
    assert_eq!(reopened.record("yt-dlp").unwrap().state, DependencyState::Installed);
}
