//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Offgrid - offline-first HTTP cache proxy
///
/// Intercepts requests for a site, serves them from versioned cache
/// partitions with per-resource strategies, and falls back to a precached
/// offline document when the network is gone.
#[derive(Parser, Debug)]
#[command(name = "offgrid")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "OFFGRID_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache version to operate on (overrides cache.version)
    #[arg(long, global = true, env = "OFFGRID_CACHE_VERSION")]
    pub cache_version: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Boot the configured version and run the proxy
    Serve(ServeArgs),

    /// Install the configured version without activating it
    Install,

    /// Activate the installed version and collect stale partitions
    Activate,

    /// Show controller state and partitions
    Status(StatusArgs),

    /// Resolve one request through the active version
    Resolve(ResolveArgs),

    /// Inspect cache partitions
    Partitions(PartitionsArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Listen address (overrides server.listen)
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Origin URL (overrides origin.url)
    #[arg(short, long)]
    pub upstream: Option<String>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Absolute URL or site path to resolve
    pub url: String,

    /// Treat the request as a navigation
    #[arg(short, long)]
    pub navigate: bool,

    /// Request method
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Print the response body
    #[arg(long)]
    pub body: bool,
}

/// Arguments for the partitions command
#[derive(Parser, Debug)]
pub struct PartitionsArgs {
    /// Subcommand for partitions
    #[command(subcommand)]
    pub action: PartitionsAction,
}

/// Partition subcommands
#[derive(Subcommand, Debug)]
pub enum PartitionsAction {
    /// List every partition with its owning version
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List the entries stored in one partition
    Show {
        /// Partition name (e.g. runtime-cache-v1)
        name: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
