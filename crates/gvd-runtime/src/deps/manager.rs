//! Per-tool install/update state machine.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use gvd_core::settings::DEFAULT_USER_AGENT;
use gvd_core::{
    AppEventEmitter, DependencyEvent, DependencyKind, DependencyRecord, DependencyState,
    ReleaseSource, is_update_available,
};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::DependencyError;
use super::record::VersionStore;
use super::spec::{DependencySpec, PrebuiltAvailability, default_specs};
use crate::download::{ArchiveKind, DownloadJob, extract_tools};

/// Where tools live and how they are fetched.
#[derive(Debug, Clone)]
pub struct DependencyManagerConfig {
    pub install_dir: PathBuf,
    pub versions_path: PathBuf,
    pub user_agent: String,
    pub specs: Vec<DependencySpec>,
}

impl DependencyManagerConfig {
    pub fn new(install_dir: impl Into<PathBuf>, versions_path: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            versions_path: versions_path.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            specs: default_specs(),
        }
    }

    #[must_use]
    pub fn with_specs(mut self, specs: Vec<DependencySpec>) -> Self {
        self.specs = specs;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Acquisition {
    Install,
    Update,
}

impl Acquisition {
    const fn busy_state(self) -> DependencyState {
        match self {
            Self::Install => DependencyState::Installing,
            Self::Update => DependencyState::Updating,
        }
    }

    const fn verb(self) -> &'static str {
        match self {
            Self::Install => "Installed",
            Self::Update => "Updated",
        }
    }
}

/// Removes the in-flight entry when an install or update ends.
struct Flight<'a> {
    in_flight: &'a Mutex<HashMap<DependencyKind, CancellationToken>>,
    kind: DependencyKind,
    token: CancellationToken,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.kind);
    }
}

/// Owns every [`DependencyRecord`] and drives install/update.
///
/// At most one install or update runs per tool; a second request for the
/// same tool is rejected with [`DependencyError::Busy`]. Different tools
/// proceed independently.
pub struct DependencyManager {
    install_dir: PathBuf,
    specs: Vec<DependencySpec>,
    store: VersionStore,
    source: Arc<dyn ReleaseSource>,
    client: Client,
    user_agent: String,
    emitter: Arc<dyn AppEventEmitter>,
    records: RwLock<HashMap<DependencyKind, DependencyRecord>>,
    in_flight: Mutex<HashMap<DependencyKind, CancellationToken>>,
}

impl DependencyManager {
    pub fn new(
        config: DependencyManagerConfig,
        source: Arc<dyn ReleaseSource>,
        client: Client,
        emitter: Arc<dyn AppEventEmitter>,
    ) -> Self {
        let store = VersionStore::new(config.versions_path);
        let persisted = store.load();

        let records = config
            .specs
            .iter()
            .map(|spec| {
                let mut record = DependencyRecord::new(spec.kind, config.install_dir.clone());
                if let Some(saved) = persisted.get(spec.kind) {
                    record.installed_version.clone_from(&saved.installed_version);
                    record.latest_version.clone_from(&saved.latest_version);
                }
                (spec.kind, record)
            })
            .collect();

        Self {
            install_dir: config.install_dir,
            specs: config.specs,
            store,
            source,
            client,
            user_agent: config.user_agent,
            emitter,
            records: RwLock::new(records),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Path of a managed executable (`"ffmpeg"`, `"yt-dlp"`).
    pub fn tool_path(&self, tool: &str) -> PathBuf {
        gvd_core::tool_path(&self.install_dir, tool)
    }

    /// Which tools are present on disk. No network access.
    ///
    /// Also settles tools still in `Unknown` and corrects tools whose files
    /// appeared or vanished since the last check.
    pub fn check_existing(&self) -> BTreeMap<String, bool> {
        self.specs
            .iter()
            .map(|spec| {
                let present = self.is_present(spec);
                let state = self.state(spec.kind);
                let settled = match (state, present) {
                    (DependencyState::Unknown | DependencyState::NotInstalled, true) => {
                        Some(DependencyState::Installed)
                    }
                    (
                        DependencyState::Unknown
                        | DependencyState::Installed
                        | DependencyState::UpdateAvailable,
                        false,
                    ) => Some(DependencyState::NotInstalled),
                    _ => None,
                };
                if let Some(next) = settled {
                    self.settle_state(spec.kind, next);
                }
                (spec.name().to_string(), present)
            })
            .collect()
    }

    /// True when every managed tool exists locally.
    pub fn ready(&self) -> bool {
        self.specs.iter().all(|spec| self.is_present(spec))
    }

    /// Snapshot of all records in configured order.
    pub fn records(&self) -> Vec<DependencyRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        self.specs
            .iter()
            .filter_map(|spec| records.get(&spec.kind).cloned())
            .collect()
    }

    pub fn record(&self, name: &str) -> Result<DependencyRecord, DependencyError> {
        let spec = self.spec(name)?;
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(&spec.kind)
            .cloned()
            .ok_or_else(|| DependencyError::UnknownDependency(name.to_string()))
    }

    pub fn is_busy(&self, name: &str) -> bool {
        self.spec(name).is_ok_and(|spec| self.flight_active(spec.kind))
    }

    /// Query the release source for the newest version.
    ///
    /// A failed query is not an error: it emits an `Info` event, leaves the
    /// state untouched and returns `Ok(None)`.
    pub async fn fetch_latest_version(&self, name: &str) -> Result<Option<String>, DependencyError> {
        let spec = self.spec(name)?;
        let kind = spec.kind;

        match self.source.latest_release(kind).await {
            Ok(release) => {
                let version = release.version();
                debug!(dependency = kind.name(), %version, "Latest version resolved");
                self.with_record(kind, |r| r.latest_version = Some(version.clone()));
                if let Err(e) = self.store.update(|file| file.mark_checked(kind, &version)) {
                    warn!(dependency = kind.name(), error = %e, "Failed to persist latest version");
                }
                Ok(Some(version))
            }
            Err(e) => {
                warn!(dependency = kind.name(), error = %e, "Latest version lookup failed");
                self.emitter.emit(
                    DependencyEvent::Info {
                        name: kind.name().to_string(),
                        message: format!("Could not check for updates: {e}"),
                    }
                    .into(),
                );
                Ok(None)
            }
        }
    }

    /// Compare the installed version with the newest release.
    ///
    /// Returns whether an update is offered. An undeterminable latest
    /// version counts as up to date.
    pub async fn check_update(&self, name: &str) -> Result<bool, DependencyError> {
        let spec = self.spec(name)?;
        let kind = spec.kind;

        if self.flight_active(kind) {
            return Err(DependencyError::Busy(kind.name().to_string()));
        }
        if !self.is_present(spec) {
            self.settle_state(kind, DependencyState::NotInstalled);
            return Err(DependencyError::NotInstalled(kind.name().to_string()));
        }

        self.settle_state(kind, DependencyState::CheckingUpdate);
        let latest = self.fetch_latest_version(name).await?;
        let installed = self.record(name)?.installed_version;

        let available = is_update_available(installed.as_deref(), latest.as_deref());
        self.settle_state(
            kind,
            if available {
                DependencyState::UpdateAvailable
            } else {
                DependencyState::Installed
            },
        );
        Ok(available)
    }

    /// Download and install the newest release. Emits exactly one `Finished`.
    pub async fn install(&self, name: &str) -> Result<String, DependencyError> {
        self.acquire(name, Acquisition::Install).await
    }

    /// Replace an installed tool with the newest release. Emits exactly one
    /// `Finished`. A tool that is not present is installed instead.
    pub async fn update(&self, name: &str) -> Result<String, DependencyError> {
        let mode = match self.spec(name) {
            Ok(spec) if self.is_present(spec) => Acquisition::Update,
            _ => Acquisition::Install,
        };
        self.acquire(name, mode).await
    }

    /// Cancel an in-flight install or update. Returns whether one was running.
    pub fn cancel(&self, name: &str) -> bool {
        let Ok(spec) = self.spec(name) else {
            return false;
        };
        let in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.get(&spec.kind).is_some_and(|token| {
            info!(dependency = spec.name(), "Cancelling install");
            token.cancel();
            true
        })
    }

    /// Leave `Failed` for the last known-good state.
    pub fn recover(&self, name: &str) -> Result<DependencyState, DependencyError> {
        let spec = self.spec(name)?;
        if self.state(spec.kind) == DependencyState::Failed {
            self.settle_state(spec.kind, self.known_good_state(spec));
        }
        Ok(self.state(spec.kind))
    }

    async fn acquire(&self, name: &str, mode: Acquisition) -> Result<String, DependencyError> {
        let (spec, flight) = match self.begin_flight(name) {
            Ok(started) => started,
            Err(e) => {
                self.finish(&label_for(name, &e), false, e.to_string());
                return Err(e);
            }
        };
        let label = spec.name().to_string();

        let result = self.run_flight(spec, &flight.token, mode).await;
        match &result {
            Ok(version) => self.finish(&label, true, format!("{} {version} successfully", mode.verb())),
            Err(e) if e.is_cancelled() => self.finish(&label, false, "cancelled".to_string()),
            Err(e) => self.finish(&label, false, e.to_string()),
        }
        self.emit_progress(spec.kind, 0);
        drop(flight);

        result.map_err(|e| {
            if e.is_cancelled() {
                DependencyError::Cancelled(label)
            } else {
                e
            }
        })
    }

    async fn run_flight(
        &self,
        spec: &DependencySpec,
        token: &CancellationToken,
        mode: Acquisition,
    ) -> Result<String, DependencyError> {
        let kind = spec.kind;
        info!(dependency = kind.name(), ?mode, "Starting acquisition");
        self.set_state(kind, mode.busy_state());
        self.emit_progress(kind, 0);

        match self.download_and_install(spec, token).await {
            Ok(version) => {
                self.with_record(kind, |r| {
                    r.installed_version = Some(version.clone());
                    r.latest_version = Some(version.clone());
                });
                self.set_state(kind, DependencyState::Installed);
                info!(dependency = kind.name(), %version, "Acquisition complete");
                Ok(version)
            }
            Err(e) if e.is_cancelled() => {
                self.set_state(kind, self.known_good_state(spec));
                info!(dependency = kind.name(), "Acquisition cancelled");
                Err(e)
            }
            Err(e) => {
                self.set_state(kind, DependencyState::Failed);
                warn!(dependency = kind.name(), error = %e, "Acquisition failed");
                Err(e)
            }
        }
    }

    async fn download_and_install(
        &self,
        spec: &DependencySpec,
        token: &CancellationToken,
    ) -> Result<String, DependencyError> {
        let kind = spec.kind;
        let selector = match &spec.availability {
            PrebuiltAvailability::Available { selector, .. } => selector,
            PrebuiltAvailability::NotAvailable { reason } => {
                return Err(DependencyError::PrebuiltNotAvailable {
                    name: kind.name().to_string(),
                    reason: reason.clone(),
                });
            }
        };

        let release = tokio::select! {
            release = self.source.latest_release(kind) => release?,
            () = token.cancelled() => return Err(DependencyError::Cancelled(kind.name().to_string())),
        };
        let version = release.version();
        let asset = release
            .assets
            .iter()
            .find(|a| selector.matches(&a.name))
            .ok_or_else(|| DependencyError::AssetNotFound {
                selector: selector.to_string(),
                tag: release.tag_name.clone(),
            })?;
        debug!(dependency = kind.name(), asset = %asset.name, %version, "Selected release asset");

        tokio::fs::create_dir_all(&self.install_dir).await?;
        let staging = tempfile::Builder::new()
            .prefix(".download-")
            .tempdir_in(&self.install_dir)?;
        let archive_path = staging.path().join(&asset.name);

        DownloadJob::new(&self.client, &asset.download_url, &archive_path)
            .user_agent(&self.user_agent)
            .cancel_token(token.clone())
            .run(|percent| self.emit_progress(kind, percent))
            .await?;

        if token.is_cancelled() {
            return Err(DependencyError::Cancelled(kind.name().to_string()));
        }

        extract_tools(
            &archive_path,
            ArchiveKind::from_name(&asset.name),
            &self.install_dir,
            &spec.executables,
        )
        .await?;

        self.store
            .update(|file| file.mark_installed(kind, &version))
            .map_err(|e| DependencyError::Persist(e.to_string()))?;

        Ok(version)
    }

    fn begin_flight(&self, name: &str) -> Result<(&DependencySpec, Flight<'_>), DependencyError> {
        let spec = self.spec(name)?;
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight.contains_key(&spec.kind) {
            debug!(dependency = spec.name(), "Rejecting concurrent acquisition");
            return Err(DependencyError::Busy(spec.name().to_string()));
        }
        let token = CancellationToken::new();
        in_flight.insert(spec.kind, token.clone());
        Ok((
            spec,
            Flight {
                in_flight: &self.in_flight,
                kind: spec.kind,
                token,
            },
        ))
    }

    fn flight_active(&self, kind: DependencyKind) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kind)
    }

    fn spec(&self, name: &str) -> Result<&DependencySpec, DependencyError> {
        let kind: DependencyKind = name
            .parse()
            .map_err(|_| DependencyError::UnknownDependency(name.to_string()))?;
        self.specs
            .iter()
            .find(|s| s.kind == kind)
            .ok_or_else(|| DependencyError::UnknownDependency(name.to_string()))
    }

    fn is_present(&self, spec: &DependencySpec) -> bool {
        spec.executables
            .iter()
            .all(|exe| self.install_dir.join(exe).is_file())
    }

    fn known_good_state(&self, spec: &DependencySpec) -> DependencyState {
        if self.is_present(spec) {
            DependencyState::Installed
        } else {
            DependencyState::NotInstalled
        }
    }

    fn state(&self, kind: DependencyKind) -> DependencyState {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(DependencyState::Unknown, |r| r.state)
    }

    fn with_record(&self, kind: DependencyKind, f: impl FnOnce(&mut DependencyRecord)) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .entry(kind)
            .or_insert_with(|| DependencyRecord::new(kind, self.install_dir.clone()));
        f(record);
    }

    fn set_state(&self, kind: DependencyKind, state: DependencyState) {
        let mut changed = false;
        self.with_record(kind, |r| {
            if r.state != state {
                r.state = state;
                changed = true;
            }
        });
        if changed {
            debug!(dependency = kind.name(), %state, "State changed");
            self.emitter.emit(
                DependencyEvent::StateChanged {
                    name: kind.name().to_string(),
                    state,
                }
                .into(),
            );
        }
    }

    /// Like `set_state`, but never overrides a running install or update.
    fn settle_state(&self, kind: DependencyKind, state: DependencyState) {
        if !self.flight_active(kind) {
            self.set_state(kind, state);
        }
    }

    fn emit_progress(&self, kind: DependencyKind, percent: u8) {
        self.emitter.emit(
            DependencyEvent::Progress {
                name: kind.name().to_string(),
                percent,
            }
            .into(),
        );
    }

    fn finish(&self, name: &str, success: bool, message: String) {
        self.emitter.emit(
            DependencyEvent::Finished {
                name: name.to_string(),
                success,
                message,
            }
            .into(),
        );
    }
}

fn label_for(name: &str, error: &DependencyError) -> String {
    match error {
        DependencyError::Busy(label) => label.clone(),
        _ => name.to_string(),
    }
}
