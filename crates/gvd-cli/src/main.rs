//! CLI entry point - the composition root.
//!
//! Logging, `.env` loading and bootstrap happen here; commands are routed
//! to handlers and their errors mapped to exit codes.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use gvd_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "gvd_core=debug,gvd_runtime=debug,gvd_cli=debug,warn"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<Result<(), CliError>> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(Ok(()));
    };

    let config = match cli.data_dir.as_deref() {
        Some(root) if !root.trim().is_empty() => CliConfig::for_root(root),
        _ => CliConfig::with_defaults()?,
    };
    let ctx = bootstrap(config)?;

    let result = match command {
        Commands::Fetch(args) => handlers::fetch::execute(&ctx, &args).await,
        Commands::Command(args) => handlers::preview::execute(&ctx, &args),
        Commands::Title { url } => handlers::title::execute(&ctx, &url).await,
        Commands::Queue { command } => handlers::queue::execute(&ctx, command).await,
        Commands::Deps { command } => handlers::deps::execute(&ctx, command).await,
        Commands::Config { command } => handlers::config::execute(&ctx, command),
        Commands::Paths => {
            handlers::paths::execute(&ctx);
            Ok(())
        }
    };
    Ok(result)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before parsing so clap `env` fallbacks see them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            eprintln!("Error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
