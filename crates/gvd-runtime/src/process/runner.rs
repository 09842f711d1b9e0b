//! Process spawning and the handle returned to coordinators.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::shutdown::{TERM_GRACE, shutdown_child};
use super::stream::spawn_pipe_reader;

/// Errors from launching or waiting on a child process.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The process could not be created; no output was produced.
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for process: {0}")]
    Wait(String),
}

/// One decoded line of merged stdout/stderr, trailing newline removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
}

/// Output of a short-lived run with stdout and stderr kept apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

impl CapturedOutput {
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// How the process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Cancellation was requested before the process ended on its own.
    pub cancelled: bool,
}

impl ExitOutcome {
    /// Exited with code 0 and was not cancelled.
    pub const fn success(&self) -> bool {
        !self.cancelled && matches!(self.code, Some(0))
    }

    fn from_status(status: ExitStatus, cancelled: bool) -> Self {
        Self {
            code: status.code(),
            cancelled,
        }
    }
}

/// What to run.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    path_prepend: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            path_prepend: None,
        }
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Put `dir` first on the child's `PATH`.
    #[must_use]
    pub fn path_prepend(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path_prepend = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null()).kill_on_drop(true);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(path) = self.search_path() {
            cmd.env("PATH", path);
        }
        cmd
    }

    fn launch_error(&self, source: io::Error) -> RunnerError {
        RunnerError::Launch {
            program: self.program.display().to_string(),
            source,
        }
    }

    fn search_path(&self) -> Option<OsString> {
        let dir = self.path_prepend.as_ref()?;
        let mut entries = vec![dir.clone()];
        if let Some(current) = env::var_os("PATH") {
            entries.extend(env::split_paths(&current));
        }
        match env::join_paths(entries) {
            Ok(joined) => Some(joined),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot prepend directory to PATH");
                None
            }
        }
    }
}

/// Spawns tools described by a [`LaunchSpec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub const fn new() -> Self {
        Self
    }

    /// Spawn the process and start streaming its merged output.
    ///
    /// Must be called from within a tokio runtime. Returns
    /// [`RunnerError::Launch`] when the executable is missing or cannot be
    /// executed.
    pub fn start(&self, spec: &LaunchSpec) -> Result<ProcessHandle, RunnerError> {
        let (reader, writer) = os_pipe::pipe().map_err(|e| spec.launch_error(e))?;
        let writer_err = writer.try_clone().map_err(|e| spec.launch_error(e))?;

        let mut cmd = spec.command();
        cmd.stdout(writer).stderr(writer_err);
        let spawned = cmd.spawn();
        // Our copies of the write end must close or the reader never sees EOF
        drop(cmd);
        let child = spawned.map_err(|e| spec.launch_error(e))?;

        let pid = child.id();
        debug!(?pid, program = %spec.program.display(), "Spawned child process");

        let (tx, rx) = mpsc::unbounded_channel();
        spawn_pipe_reader(reader, pid, tx);

        let cancel = CancellationToken::new();
        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(supervise(child, pid, cancel.clone(), exit_tx));

        Ok(ProcessHandle {
            pid,
            lines: rx,
            cancel,
            exit: Some(exit_rx),
        })
    }

    /// Run to completion and collect stdout and stderr separately.
    ///
    /// For quick queries such as title lookups where only stdout carries
    /// the answer.
    pub async fn capture(&self, spec: &LaunchSpec) -> Result<CapturedOutput, RunnerError> {
        let mut cmd = spec.command();
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let child = cmd.spawn().map_err(|e| spec.launch_error(e))?;
        debug!(pid = ?child.id(), program = %spec.program.display(), "Spawned capture process");

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RunnerError::Wait(e.to_string()))?;
        Ok(CapturedOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }
}

enum Ending {
    Exited(io::Result<ExitStatus>),
    Cancelled,
}

async fn supervise(
    mut child: Child,
    pid: Option<u32>,
    cancel: CancellationToken,
    exit_tx: oneshot::Sender<io::Result<ExitOutcome>>,
) {
    let ending = tokio::select! {
        status = child.wait() => Ending::Exited(status),
        () = cancel.cancelled() => Ending::Cancelled,
    };

    let outcome = match ending {
        Ending::Exited(status) => status.map(|s| ExitOutcome::from_status(s, false)),
        Ending::Cancelled => {
            debug!(?pid, "Cancellation requested, terminating child");
            shutdown_child(child, TERM_GRACE).await.map(|shutdown| {
                if shutdown.forced {
                    warn!(?pid, "Child had to be killed after the grace period");
                }
                ExitOutcome::from_status(shutdown.status, true)
            })
        }
    };

    debug!(?pid, ?outcome, "Child process ended");
    let _ = exit_tx.send(outcome);
}

/// Handle to a running child.
///
/// The line stream is finite: [`next_line`](Self::next_line) returns `None`
/// once the output pipe is closed, and it cannot be restarted.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    lines: mpsc::UnboundedReceiver<OutputLine>,
    cancel: CancellationToken,
    exit: Option<oneshot::Receiver<io::Result<ExitOutcome>>>,
}

impl ProcessHandle {
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Next output line, or `None` at end of output.
    pub async fn next_line(&mut self) -> Option<OutputLine> {
        self.lines.recv().await
    }

    /// Request termination. Best-effort; buffered output is still delivered.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this process when triggered.
    pub fn canceller(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the process to end and return how it ended.
    ///
    /// Can be awaited once; later calls return [`RunnerError::Wait`].
    pub async fn wait(&mut self) -> Result<ExitOutcome, RunnerError> {
        let rx = self
            .exit
            .take()
            .ok_or_else(|| RunnerError::Wait("exit status already taken".to_string()))?;
        match rx.await {
            Ok(result) => result.map_err(|e| RunnerError::Wait(e.to_string())),
            Err(_) => Err(RunnerError::Wait("process supervisor dropped".to_string())),
        }
    }

    /// Drain remaining output, then wait for exit.
    pub async fn finish(mut self) -> Result<(Vec<OutputLine>, ExitOutcome), RunnerError> {
        let mut rest = Vec::new();
        while let Some(line) = self.next_line().await {
            rest.push(line);
        }
        let outcome = self.wait().await?;
        Ok((rest, outcome))
    }
}
