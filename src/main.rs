//! Offgrid - offline-first HTTP cache proxy
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use offgrid::cli::args::ConfigAction;
use offgrid::cli::{Cli, Commands};
use offgrid::config::{Config, ConfigManager};
use offgrid::error::OffgridResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> OffgridResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Config init must work even when the existing file is unreadable
    if let Commands::Config(ref args) = cli.command {
        if let Some(ConfigAction::Init { force }) = &args.action {
            init_logging(cli.verbose, &Config::default());
            return offgrid::cli::commands::config::init_config(&config_manager, *force).await;
        }
    }

    let mut config = config_manager.load().await?;
    if let Some(version) = cli.cache_version {
        config.cache.version = version;
    }

    init_logging(cli.verbose, &config);
    debug!(path = %config_manager.path().display(), version = %config.cache.version, "Loaded configuration");

    match cli.command {
        Commands::Serve(args) => offgrid::cli::commands::serve(args, &config).await,
        Commands::Install => offgrid::cli::commands::install(&config).await,
        Commands::Activate => offgrid::cli::commands::activate(&config).await,
        Commands::Status(args) => offgrid::cli::commands::status(args, &config).await,
        Commands::Resolve(args) => offgrid::cli::commands::resolve(args, &config).await,
        Commands::Partitions(args) => offgrid::cli::commands::partitions(args, &config).await,
        Commands::Config(args) => {
            offgrid::cli::commands::config(args, &config_manager, &config).await
        }
    }
}

/// Initialize logging: 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("offgrid=warn"),
        1 => EnvFilter::new("offgrid=info"),
        _ => EnvFilter::new("offgrid=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .init();
    }
}
