//! CLI bootstrap - the composition root.
//!
//! This module is the only place where concrete adapters are wired
//! together: the HTTP client, the GitHub release source, the connectivity
//! probe, the dependency manager, the job controller and the download
//! queue all share one channel emitter whose receiver the handlers drain.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gvd_core::{
    AppEvent, Settings, config_path, data_root, load_settings, queue_path, requirements_dir,
    versions_path,
};
use gvd_runtime::{
    ChannelEmitter, DependencyManager, DependencyManagerConfig, GitHubReleaseSource,
    HttpConnectivityProbe, JobQueue, ToolPaths, VideoJobController,
};
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

/// Where the CLI keeps its state.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_root: PathBuf,
    pub requirements_dir: PathBuf,
    pub versions_path: PathBuf,
    pub config_path: PathBuf,
    pub queue_path: PathBuf,
}

impl CliConfig {
    /// Resolve paths from the environment and platform defaults.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self {
            data_root: data_root()?,
            requirements_dir: requirements_dir()?,
            versions_path: versions_path()?,
            config_path: config_path()?,
            queue_path: queue_path()?,
        })
    }

    /// Keep everything under `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let data_root = root.into();
        let requirements_dir = data_root.join("requirements");
        Self {
            versions_path: requirements_dir.join("versions.json"),
            config_path: data_root.join("config.json"),
            queue_path: data_root.join("queue.json"),
            requirements_dir,
            data_root,
        }
    }
}

/// Fully composed context for command handlers.
pub struct CliContext {
    pub config: CliConfig,
    pub settings: Settings,
    pub deps: Arc<DependencyManager>,
    pub jobs: Arc<VideoJobController>,
    pub queue: JobQueue,
    /// Events from the dependency manager, the job controller and the queue.
    pub events: Mutex<UnboundedReceiver<AppEvent>>,
}

impl CliContext {
    pub fn deps(&self) -> &Arc<DependencyManager> {
        &self.deps
    }

    pub fn jobs(&self) -> &Arc<VideoJobController> {
        &self.jobs
    }

    pub const fn queue(&self) -> &JobQueue {
        &self.queue
    }
}

/// Build the CLI context.
pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let settings = load_settings(&config.config_path)
        .with_context(|| format!("Failed to load settings from {}", config.config_path.display()))?;
    let user_agent = settings.effective_user_agent().to_string();

    let client = reqwest::Client::builder()
        .user_agent(&user_agent)
        .build()
        .context("Failed to build HTTP client")?;

    let (emitter, events) = ChannelEmitter::new();
    let emitter = Arc::new(emitter);

    let source = Arc::new(GitHubReleaseSource::new(client.clone(), user_agent.clone()));
    let deps_config = DependencyManagerConfig::new(&config.requirements_dir, &config.versions_path)
        .with_user_agent(user_agent);
    let deps = Arc::new(DependencyManager::new(
        deps_config,
        source,
        client.clone(),
        emitter.clone(),
    ));

    let probe = Arc::new(HttpConnectivityProbe::new(
        client,
        settings.effective_connectivity_url(),
        Duration::from_secs(settings.effective_connectivity_timeout_secs()),
    ));
    let jobs = Arc::new(VideoJobController::new(
        ToolPaths::in_dir(&config.requirements_dir),
        probe,
        emitter.clone(),
    ));
    let queue = JobQueue::load(Arc::clone(&jobs), emitter, &config.queue_path);

    debug!(root = %config.data_root.display(), "CLI context ready");

    Ok(CliContext {
        config,
        settings,
        deps,
        jobs,
        queue,
        events: Mutex::new(events),
    })
}
