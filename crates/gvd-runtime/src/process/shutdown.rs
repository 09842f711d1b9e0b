//! Stopping a fetch-tool child: SIGTERM first so yt-dlp can clean up its
//! `.part` files, SIGKILL once the grace period runs out.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tracing::debug;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Grace period between SIGTERM and SIGKILL for job processes.
pub const TERM_GRACE: Duration = Duration::from_secs(5);

/// How a stopped child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shutdown {
    pub status: ExitStatus,
    /// The child outlived the grace period and was killed.
    pub forced: bool,
}

/// Stop `child` and reap it.
///
/// On Unix the child gets SIGTERM and `grace` to exit on its own. On
/// Windows there is no polite signal, so it is killed at once and reported
/// as forced.
pub async fn shutdown_child(mut child: Child, grace: Duration) -> io::Result<Shutdown> {
    #[cfg(unix)]
    {
        terminate(&mut child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        child.kill().await?;
        Ok(Shutdown {
            status: child.wait().await?,
            forced: true,
        })
    }
}

#[cfg(unix)]
async fn terminate(child: &mut Child, grace: Duration) -> io::Result<Shutdown> {
    let graceful = |status| Shutdown { status, forced: false };

    let Some(pid) = child.id() else {
        return child.wait().await.map(graceful);
    };
    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "PID out of range"))?;

    match signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => {}
        Err(nix::errno::Errno::ESRCH) => return child.wait().await.map(graceful),
        Err(e) => return Err(io::Error::other(e)),
    }

    if let Ok(result) = tokio::time::timeout(grace, child.wait()).await {
        return result.map(graceful);
    }

    debug!(pid, ?grace, "Tool ignored SIGTERM, killing");
    child.kill().await?;
    Ok(Shutdown {
        status: child.wait().await?,
        forced: true,
    })
}
