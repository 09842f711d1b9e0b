//! `gvd fetch`: run one download with a live progress bar.

use gvd_core::{AppEvent, JobEvent, JobOutcome};
use tracing::debug;

use super::deps::ensure_tools;
use super::options::build_options;
use crate::bootstrap::CliContext;
use crate::commands::FetchArgs;
use crate::error::CliError;
use crate::presentation::{bar_position, job_bar};

/// Start the job and follow its events until it finishes.
///
/// Ctrl-C stops the job; the tool is given its grace period and the
/// command then exits with the cancellation code.
pub async fn execute(ctx: &CliContext, args: &FetchArgs) -> Result<(), CliError> {
    let options = build_options(args, &ctx.settings)?;
    ensure_tools(ctx, args.install_missing).await?;

    let mut events = ctx.events.lock().await;
    // Drop anything left over from the install step
    while events.try_recv().is_ok() {}

    let job_id = ctx.jobs().start(&options).await?;
    let bar = job_bar();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stopping = false;

    let outcome = loop {
        tokio::select! {
            event = events.recv() => {
                let event = match event {
                    Some(AppEvent::Job(event)) => event,
                    Some(_) => continue,
                    None => break JobOutcome::Failed { message: "Event channel closed".to_string() },
                };
                if event.job_id() != job_id {
                    continue;
                }
                match event {
                    JobEvent::Started { command, .. } => debug!(?command, "Job command"),
                    JobEvent::Output { line, .. } => {
                        if !args.quiet {
                            bar.println(line);
                        }
                    }
                    JobEvent::Progress { percent, eta, .. } => {
                        bar.set_position(bar_position(percent));
                        bar.set_message(eta.map(|e| format!("ETA {e}")).unwrap_or_default());
                    }
                    JobEvent::Finished { outcome, .. } => break outcome,
                }
            }
            _ = &mut ctrl_c, if !stopping => {
                stopping = true;
                bar.set_message("stopping...");
                ctx.jobs().stop();
            }
        }
    };

    match outcome {
        JobOutcome::Succeeded => {
            bar.set_position(100);
            bar.finish_with_message("done");
            println!("{}", outcome.message());
            Ok(())
        }
        JobOutcome::Cancelled => {
            bar.abandon_with_message("stopped");
            Err(CliError::Cancelled(outcome.message().to_string()))
        }
        JobOutcome::Failed { .. } => {
            bar.abandon_with_message("failed");
            Err(CliError::Job(outcome.message().to_string()))
        }
    }
}
