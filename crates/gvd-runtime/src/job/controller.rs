//! Video job controller.
//!
//! Turns validated [`JobOptions`] into a running fetch tool, forwards its
//! output and progress as [`JobEvent`]s, and classifies how it ended.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use gvd_core::{
    AppEventEmitter, ConnectivityProbe, JobEvent, JobId, JobOptions, JobOutcome, tool_path,
    validate_job_options, validate_url,
};
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::JobError;
use super::logs::JobLogManager;
use crate::command::{build_args, render_command, title_args};
use crate::process::{LaunchSpec, ProcessHandle, ProcessRunner};
use crate::progress;

/// Shown when the tool exits unsuccessfully. The tool's own output has
/// already been forwarded line by line.
pub const FAILURE_MESSAGE: &str = "Download failed. Check output for details.";

/// Locations of the external executables.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub fetch_tool: PathBuf,
    pub ffmpeg: PathBuf,
}

impl ToolPaths {
    pub fn new(fetch_tool: impl Into<PathBuf>, ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            fetch_tool: fetch_tool.into(),
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Both tools inside one install directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(tool_path(dir, "yt-dlp"), tool_path(dir, "ffmpeg"))
    }

    fn ffmpeg_dir(&self) -> Option<&Path> {
        self.ffmpeg.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

/// Progress and outcome of one job, for callers that schedule jobs.
#[derive(Debug)]
pub struct JobWatch {
    pub job_id: JobId,
    /// Latest reported percent; drops back to zero on stop. Closes when the
    /// job leaves the registry.
    pub progress: watch::Receiver<f64>,
    /// Resolves after the job's `Finished` event has been emitted.
    pub outcome: oneshot::Receiver<JobOutcome>,
}

#[derive(Debug)]
struct RunningJob {
    cancel: CancellationToken,
    last_percent: f64,
    stopping: bool,
    progress: watch::Sender<f64>,
}

type Registry = Arc<Mutex<HashMap<JobId, RunningJob>>>;

/// Runs fetch jobs and reports them through an [`AppEventEmitter`].
///
/// Callers are expected to run one job at a time; the registry tolerates
/// more and [`stop`](Self::stop) cancels all of them.
pub struct VideoJobController {
    tools: ToolPaths,
    runner: ProcessRunner,
    probe: Arc<dyn ConnectivityProbe>,
    emitter: Arc<dyn AppEventEmitter>,
    logs: Arc<JobLogManager>,
    jobs: Registry,
}

impl VideoJobController {
    pub fn new(
        tools: ToolPaths,
        probe: Arc<dyn ConnectivityProbe>,
        emitter: Arc<dyn AppEventEmitter>,
    ) -> Self {
        Self {
            tools,
            runner: ProcessRunner::new(),
            probe,
            emitter,
            logs: Arc::new(JobLogManager::new()),
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub const fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    pub fn logs(&self) -> Arc<JobLogManager> {
        Arc::clone(&self.logs)
    }

    pub fn is_active(&self) -> bool {
        !lock(&self.jobs).is_empty()
    }

    pub fn active_jobs(&self) -> Vec<JobId> {
        lock(&self.jobs).keys().copied().collect()
    }

    /// Argument vector the tool would receive for these options.
    pub fn command_args(&self, options: &JobOptions) -> Vec<String> {
        build_args(options, &self.tools.ffmpeg)
    }

    /// Shell-quoted command line for display.
    pub fn preview_command(&self, options: &JobOptions) -> String {
        render_command(&self.tools.fetch_tool, &self.command_args(options))
    }

    /// Validate, check connectivity and launch a job.
    ///
    /// Nothing is emitted when this returns an error. On success `Started`
    /// and a zero `Progress` have been emitted and a background task drives
    /// the job to exactly one `Finished` event.
    pub async fn start(&self, options: &JobOptions) -> Result<JobId, JobError> {
        self.start_watched(options).await.map(|watch| watch.job_id)
    }

    /// [`start`](Self::start), also handing back the job's progress and outcome.
    pub async fn start_watched(&self, options: &JobOptions) -> Result<JobWatch, JobError> {
        validate_job_options(options)?;

        if !self.probe.is_online().await {
            warn!(url = %options.url, "Connectivity check failed, not starting job");
            return Err(JobError::Connectivity);
        }

        let args = self.command_args(options);
        let mut spec = LaunchSpec::new(&self.tools.fetch_tool).args(args.iter());
        if let Some(dir) = self.tools.ffmpeg_dir() {
            spec = spec.path_prepend(dir);
        }

        let handle = self.runner.start(&spec)?;
        let job_id = JobId::new();
        let cancel = handle.canceller();
        let (progress_tx, progress_rx) = watch::channel(0.0);
        let (outcome_tx, outcome_rx) = oneshot::channel();

        lock(&self.jobs).insert(
            job_id,
            RunningJob {
                cancel,
                last_percent: 0.0,
                stopping: false,
                progress: progress_tx,
            },
        );

        let mut command = Vec::with_capacity(args.len() + 1);
        command.push(self.tools.fetch_tool.display().to_string());
        command.extend(args);

        info!(%job_id, pid = ?handle.pid(), url = %options.url, "Job started");
        self.emitter
            .emit(JobEvent::Started { job_id, command }.into());
        self.emitter.emit(reset_progress(job_id).into());

        tokio::spawn(drive(
            job_id,
            handle,
            Arc::clone(&self.jobs),
            Arc::clone(&self.emitter),
            Arc::clone(&self.logs),
            outcome_tx,
        ));

        Ok(JobWatch {
            job_id,
            progress: progress_rx,
            outcome: outcome_rx,
        })
    }

    /// Stop every active job.
    ///
    /// Returns `false` and emits nothing when no job is running. Progress is
    /// reset to zero immediately; the job's own `Finished` event follows once
    /// the process is gone.
    pub fn stop(&self) -> bool {
        let mut jobs = lock(&self.jobs);
        if jobs.is_empty() {
            return false;
        }
        for (job_id, job) in jobs.iter_mut() {
            self.request_stop(*job_id, job);
        }
        true
    }

    pub fn stop_job(&self, job_id: JobId) -> Result<(), JobError> {
        let mut jobs = lock(&self.jobs);
        let job = jobs.get_mut(&job_id).ok_or(JobError::UnknownJob(job_id))?;
        self.request_stop(job_id, job);
        Ok(())
    }

    // Called with the registry locked so no progress event can interleave
    fn request_stop(&self, job_id: JobId, job: &mut RunningJob) {
        if job.stopping {
            return;
        }
        info!(%job_id, "Stopping job");
        job.stopping = true;
        job.last_percent = 0.0;
        job.progress.send_replace(0.0);
        job.cancel.cancel();
        self.emitter.emit(reset_progress(job_id).into());
    }

    /// Ask the tool for the title of a URL without downloading it.
    pub async fn fetch_title(&self, url: &str) -> Result<String, JobError> {
        let url = validate_url(url)?;
        let spec = LaunchSpec::new(&self.tools.fetch_tool).args(title_args(url.as_str()));
        let output = self.runner.capture(&spec).await?;

        let title = output
            .stdout
            .lines()
            .map(str::trim)
            .find(|t| !t.is_empty());

        match title {
            Some(title) if output.success() => Ok(title.to_string()),
            _ => {
                let detail = output
                    .stderr
                    .lines()
                    .rev()
                    .map(str::trim)
                    .find(|t| !t.is_empty())
                    .unwrap_or("no title returned");
                Err(JobError::Execution {
                    code: output.code,
                    message: format!("Failed to fetch title: {detail}"),
                })
            }
        }
    }
}

async fn drive(
    job_id: JobId,
    mut handle: ProcessHandle,
    jobs: Registry,
    emitter: Arc<dyn AppEventEmitter>,
    logs: Arc<JobLogManager>,
    done: oneshot::Sender<JobOutcome>,
) {
    while let Some(line) = handle.next_line().await {
        debug!(%job_id, "{}", line.text);
        logs.add_line(job_id, &line.text);

        let update = progress::parse_line(&line.text);
        emitter.emit(
            JobEvent::Output {
                job_id,
                line: line.text,
            }
            .into(),
        );

        if let Some(update) = update {
            let mut registry = lock(&jobs);
            if let Some(job) = registry.get_mut(&job_id) {
                if !job.stopping && update.percent >= job.last_percent {
                    job.last_percent = update.percent;
                    job.progress.send_replace(update.percent);
                    emitter.emit(
                        JobEvent::Progress {
                            job_id,
                            percent: update.percent,
                            eta: update.eta,
                        }
                        .into(),
                    );
                }
            }
        }
    }

    let stopping = lock(&jobs).get(&job_id).is_some_and(|j| j.stopping);
    let outcome = match handle.wait().await {
        Ok(exit) if stopping || exit.cancelled => JobOutcome::Cancelled,
        Ok(exit) if exit.success() => JobOutcome::Succeeded,
        Ok(exit) => {
            warn!(%job_id, code = ?exit.code, "Job failed");
            JobOutcome::Failed {
                message: FAILURE_MESSAGE.to_string(),
            }
        }
        Err(e) if stopping => {
            debug!(%job_id, error = %e, "Wait failed after stop");
            JobOutcome::Cancelled
        }
        Err(e) => {
            warn!(%job_id, error = %e, "Lost track of job process");
            JobOutcome::Failed {
                message: FAILURE_MESSAGE.to_string(),
            }
        }
    };

    info!(%job_id, ?outcome, "Job finished");
    {
        // Remove before emitting so observers of Finished see an idle controller
        let mut registry = lock(&jobs);
        registry.remove(&job_id);
    }
    emitter.emit(
        JobEvent::Finished {
            job_id,
            outcome: outcome.clone(),
        }
        .into(),
    );
    emitter.emit(reset_progress(job_id).into());
    // Plain `start` callers dropped the receiver
    let _ = done.send(outcome);
}

const fn reset_progress(job_id: JobId) -> JobEvent {
    JobEvent::Progress {
        job_id,
        percent: 0.0,
        eta: None,
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
