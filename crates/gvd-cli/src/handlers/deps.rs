//! `gvd deps`: inspect, install, check and update the managed tools.

use gvd_core::{AppEvent, DependencyEvent};
use gvd_runtime::DependencyError;
use indicatif::ProgressBar;

use crate::bootstrap::CliContext;
use crate::deps_commands::DepsCommand;
use crate::error::CliError;
use crate::presentation::{dependency_bar, format_optional, print_separator, state_label};

#[derive(Debug, Clone, Copy)]
enum Operation {
    Install,
    Update,
}

pub async fn execute(ctx: &CliContext, command: DepsCommand) -> Result<(), CliError> {
    match command {
        DepsCommand::Status => {
            status(ctx);
            Ok(())
        }
        DepsCommand::Install { name, force } => {
            for name in names(ctx, name) {
                if !force && ctx.deps().check_existing().get(&name) == Some(&true) {
                    println!("{name} is already installed (use --force to reinstall)");
                    continue;
                }
                run_with_progress(ctx, &name, Operation::Install).await?;
            }
            Ok(())
        }
        DepsCommand::Check { name } => check(ctx, name).await,
        DepsCommand::Update { name } => {
            for name in names(ctx, name) {
                run_with_progress(ctx, &name, Operation::Update).await?;
            }
            Ok(())
        }
    }
}

/// Make sure both tools are present, installing them when `install` is set.
pub async fn ensure_tools(ctx: &CliContext, install: bool) -> Result<(), CliError> {
    if ctx.deps().ready() {
        return Ok(());
    }
    if install {
        return install_missing(ctx).await;
    }
    let missing: Vec<String> = ctx
        .deps()
        .check_existing()
        .into_iter()
        .filter_map(|(name, present)| (!present).then_some(name))
        .collect();
    Err(CliError::Dependency(format!(
        "Missing tools: {}. Run `gvd deps install` or pass --install-missing.",
        missing.join(", ")
    )))
}

/// Install every tool that is not present yet.
pub async fn install_missing(ctx: &CliContext) -> Result<(), CliError> {
    let missing: Vec<String> = ctx
        .deps()
        .check_existing()
        .into_iter()
        .filter_map(|(name, present)| (!present).then_some(name))
        .collect();
    for name in missing {
        run_with_progress(ctx, &name, Operation::Install).await?;
    }
    Ok(())
}

fn names(ctx: &CliContext, name: Option<String>) -> Vec<String> {
    name.map_or_else(
        || {
            ctx.deps()
                .records()
                .into_iter()
                .map(|r| r.kind.name().to_string())
                .collect()
        },
        |n| vec![n],
    )
}

fn status(ctx: &CliContext) {
    ctx.deps().check_existing();

    println!("{:<8} {:<22} {:<24} {:<24}", "TOOL", "STATE", "INSTALLED", "LATEST");
    print_separator(80);
    for record in ctx.deps().records() {
        println!(
            "{:<8} {:<22} {:<24} {:<24}",
            record.kind.name(),
            state_label(record.state),
            format_optional(record.installed_version.as_ref(), "-"),
            format_optional(record.latest_version.as_ref(), "-"),
        );
    }
    print_separator(80);
    println!("Install directory: {}", ctx.deps().install_dir().display());
    println!(
        "Ready: {}",
        if ctx.deps().ready() { "yes" } else { "no (run `gvd deps install`)" }
    );
}

async fn check(ctx: &CliContext, name: Option<String>) -> Result<(), CliError> {
    let mut events = ctx.events.lock().await;
    for name in names(ctx, name) {
        let result = ctx.deps().check_update(&name).await;

        // Lookup failures arrive as Info events rather than errors
        while let Ok(event) = events.try_recv() {
            if let AppEvent::Dependency(DependencyEvent::Info { name, message }) = event {
                eprintln!("{name}: {message}");
            }
        }

        match result {
            Ok(true) => {
                let record = ctx.deps().record(&name)?;
                println!(
                    "{name}: update available ({} -> {})",
                    format_optional(record.installed_version.as_ref(), "unknown"),
                    format_optional(record.latest_version.as_ref(), "unknown"),
                );
            }
            Ok(false) => {
                let record = ctx.deps().record(&name)?;
                println!(
                    "{name}: up to date ({})",
                    format_optional(record.installed_version.as_ref(), "unknown version"),
                );
            }
            Err(DependencyError::NotInstalled(_)) => println!("{name}: not installed"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn run_with_progress(ctx: &CliContext, name: &str, op: Operation) -> Result<String, CliError> {
    let mut events = ctx.events.lock().await;
    let bar = dependency_bar(name);

    let work = async {
        match op {
            Operation::Install => ctx.deps().install(name).await,
            Operation::Update => ctx.deps().update(name).await,
        }
    };
    tokio::pin!(work);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut cancelling = false;

    let result = loop {
        tokio::select! {
            result = &mut work => break result,
            Some(event) = events.recv() => render(&bar, event),
            _ = &mut ctrl_c, if !cancelling => {
                cancelling = true;
                bar.set_message("cancelling...");
                ctx.deps().cancel(name);
            }
        }
    };
    while let Ok(event) = events.try_recv() {
        render(&bar, event);
    }

    match result {
        Ok(version) => {
            bar.set_position(100);
            bar.finish_with_message(format!("{version} ready"));
            Ok(version)
        }
        Err(e) => {
            bar.abandon_with_message(e.status_label());
            Err(e.into())
        }
    }
}

fn render(bar: &ProgressBar, event: AppEvent) {
    let AppEvent::Dependency(event) = event else {
        return;
    };
    match event {
        DependencyEvent::StateChanged { state, .. } => bar.set_message(state_label(state)),
        DependencyEvent::Progress { percent, .. } => bar.set_position(u64::from(percent)),
        DependencyEvent::Info { message, .. } => bar.println(message),
        // The final message is set from the returned result
        DependencyEvent::Finished { .. } => {}
    }
}
