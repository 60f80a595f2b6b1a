// ABOUTME: Entry point for the fleetvisor CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;
use fleetvisor::config;
use fleetvisor::error::Result;
use fleetvisor::orchestrator::GracefulRestartOptions;
use fleetvisor::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let cwd = env::current_dir()?;
    let config_path = cli.config;
    let ctx = || Context::load(config_path.as_deref(), &cwd, Output::new(mode));

    match cli.command {
        Commands::Init { socket_dir, force } => {
            config::init_config(&cwd, socket_dir.as_deref(), force)?;
            Output::new(mode).success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Status { domains } => commands::status(ctx()?, &domains).await,
        Commands::Stop {
            target,
            no_wait,
            force_kill_timeout,
        } => {
            commands::stop(
                ctx()?,
                &target.domains,
                target.processes(),
                !no_wait,
                force_kill_timeout,
            )
            .await
        }
        Commands::Start { target, state } => {
            commands::start(ctx()?, &target.domains, target.processes(), state.as_deref()).await
        }
        Commands::Restart {
            domains,
            no_wait,
            wait_workers,
            force_kill_timeout,
        } => commands::restart(ctx()?, &domains, !no_wait, wait_workers, force_kill_timeout).await,
        Commands::GracefulRestart {
            domains,
            suspend,
            wait_jobs,
            pause_upstream,
            timeout,
            poll_interval,
            no_wait,
        } => {
            let opts = GracefulRestartOptions {
                suspend,
                wait_jobs,
                pause_upstream,
                timeout,
                poll_interval,
                wait: !no_wait,
            };
            commands::graceful_restart(ctx()?, &domains, opts).await
        }
        Commands::Suspend => commands::suspend(ctx()?).await,
        Commands::Resume => commands::resume(ctx()?).await,
    }
}
