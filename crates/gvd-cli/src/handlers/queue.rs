//! `gvd queue`: keep a list of downloads and run them one after another.

use gvd_core::{AppEvent, JobEvent, QueueEvent, QueueItemId, QueueStatus};
use indicatif::ProgressBar;

use super::deps::ensure_tools;
use super::options::build_options;
use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{bar_position, job_bar, print_separator};
use crate::queue_commands::QueueCommand;

pub async fn execute(ctx: &CliContext, command: QueueCommand) -> Result<(), CliError> {
    match command {
        QueueCommand::List { json } => list(ctx, json),
        QueueCommand::Add { fetch, title } => {
            let options = build_options(&fetch, &ctx.settings)?;
            let id = match title {
                Some(title) => ctx.queue().add(&title, options)?,
                None => ctx.queue().fetch_and_add(options, false).await?,
            };
            if let Some(item) = ctx.queue().item(id) {
                println!("Queued {}: {}", item.id, item.title);
            }
            Ok(())
        }
        QueueCommand::Remove { id } => {
            let id: QueueItemId = id
                .parse()
                .map_err(|_| CliError::Arguments(format!("Not a queue item id: {id}")))?;
            let item = ctx.queue().remove(id)?;
            println!("Removed {}", item.title);
            Ok(())
        }
        QueueCommand::Clear => {
            ctx.queue().clear()?;
            println!("Queue cleared");
            Ok(())
        }
        QueueCommand::Run {
            install_missing,
            quiet,
        } => run(ctx, install_missing, quiet).await,
    }
}

fn list(ctx: &CliContext, json: bool) -> Result<(), CliError> {
    let items = ctx.queue().items();
    if json {
        let rendered =
            serde_json::to_string_pretty(&items).map_err(|e| CliError::Io(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }
    if items.is_empty() {
        println!("Queue is empty");
        return Ok(());
    }

    println!("{:<36}  {:<12} {:>5}  TITLE", "ID", "STATUS", "DONE");
    print_separator(80);
    for item in items {
        println!(
            "{:<36}  {:<12} {:>4}%  {}",
            item.id,
            item.status.label(),
            bar_position(item.progress),
            item.title
        );
    }
    Ok(())
}

/// Work through the queue with one progress bar per download.
///
/// Ctrl-C stops the running download and ends the run; the command then
/// exits with the cancellation code.
async fn run(ctx: &CliContext, install_missing: bool, quiet: bool) -> Result<(), CliError> {
    let runnable = ctx
        .queue()
        .items()
        .iter()
        .any(|i| matches!(i.status, QueueStatus::Queued | QueueStatus::Stopped));
    if !runnable {
        println!("Nothing to download");
        return Ok(());
    }
    ensure_tools(ctx, install_missing).await?;

    let mut events = ctx.events.lock().await;
    // Drop anything left over from the install step
    while events.try_recv().is_ok() {}

    ctx.queue().start_all().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stopping = false;
    let mut bar: Option<ProgressBar> = None;
    let mut settled = 0usize;
    let mut failed = 0usize;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    AppEvent::Queue(QueueEvent::StatusChanged {
                        item_id,
                        status: QueueStatus::Downloading,
                        ..
                    }) => {
                        let title = ctx.queue().item(item_id).map(|i| i.title).unwrap_or_default();
                        println!("==> {title}");
                        bar = Some(job_bar());
                    }
                    AppEvent::Queue(QueueEvent::Progress { percent, .. }) => {
                        if let Some(bar) = &bar {
                            bar.set_position(bar_position(percent));
                        }
                    }
                    AppEvent::Job(JobEvent::Output { line, .. }) if !quiet => match &bar {
                        Some(bar) => bar.println(line),
                        None => println!("{line}"),
                    },
                    AppEvent::Queue(QueueEvent::ItemFinished { item_id, success, .. }) => {
                        settled += 1;
                        if !success {
                            failed += 1;
                        }
                        let label = ctx
                            .queue()
                            .item(item_id)
                            .map_or("removed", |i| i.status.label());
                        if let Some(bar) = bar.take() {
                            if success {
                                bar.set_position(100);
                                bar.finish_with_message(label);
                            } else {
                                bar.abandon_with_message(label);
                            }
                        }
                        if stopping && !ctx.queue().is_running() {
                            break;
                        }
                    }
                    AppEvent::Queue(QueueEvent::AllFinished) => break,
                    _ => {}
                }
            }
            _ = &mut ctrl_c, if !stopping => {
                stopping = true;
                if let Some(bar) = &bar {
                    bar.set_message("stopping...");
                }
                ctx.queue().stop_all();
                if !ctx.queue().is_running() {
                    break;
                }
            }
        }
    }

    if stopping {
        return Err(CliError::Cancelled("Queue stopped".to_string()));
    }
    if failed > 0 {
        return Err(CliError::Job(format!("{failed} of {settled} downloads failed")));
    }
    println!("All downloads finished");
    Ok(())
}
