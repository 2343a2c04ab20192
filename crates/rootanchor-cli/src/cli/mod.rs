//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use std::time::Duration;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    // CLI flags win over config file values
    let output_format = cli
        .output
        .or(config.output_format)
        .unwrap_or(OutputFormat::Pretty);
    let timeout = Duration::from_secs(cli.timeout.unwrap_or(config.timeout_secs));

    let ctx = commands::Context {
        output_format,
        timeout,
        default_nickname: config.nickname,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Install(args) => commands::install::execute(ctx, args).await,
        Commands::Uninstall(args) => commands::uninstall::execute(ctx, args).await,
        Commands::Status(args) => commands::status::execute(ctx, args).await,
        Commands::Expiry(args) => commands::expiry::execute(ctx, args).await,
        Commands::Browser => commands::browser::execute(ctx).await,
    }
}

/// Logs go to stderr so structured output on stdout stays parseable.
fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
