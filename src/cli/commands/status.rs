//! Status command - show controller record and partitions

use crate::cache::PartitionSet;
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::{Config, ConfigManager};
use crate::engine::Lifecycle;
use crate::error::OffgridResult;
use console::style;
use serde_json::json;

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> OffgridResult<()> {
    let lifecycle = Lifecycle::from_config(config)?;
    let record = lifecycle.record().await?;
    let names = lifecycle.cache().list_partition_names().await?;
    let partitions = PartitionSet::new(lifecycle.version());

    if let OutputFormat::Json = args.format {
        let out = json!({
            "configured_version": lifecycle.version(),
            "origin": config.origin.url,
            "cache_dir": ConfigManager::cache_dir(config),
            "record": record,
            "partitions": names,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", style("Offgrid Status").bold().cyan());
    println!();
    println!("  Origin:   {}", config.origin.url);
    println!("  Storage:  {}", ConfigManager::cache_dir(config).display());
    println!("  Version:  {}", lifecycle.version());
    println!();

    println!("{}", style("Controller:").bold());
    match &record {
        Some(record) => {
            let active = record.active_version.as_deref().unwrap_or("none");
            println!("  Last install: {} ({})", record.version, record.state);
            println!("  Active:       {}", style(active).green());
            println!("  Precached:    {}", record.precached);
            if let Some(at) = record.activated_at {
                println!("  Activated at: {}", at.format("%Y-%m-%d %H:%M:%S"));
            }
        }
        None => println!("  {}", style("Not installed").yellow()),
    }
    println!();

    println!("{}", style("Partitions:").bold());
    if names.is_empty() {
        println!("  none");
    }
    for name in &names {
        let marker = if partitions.owns(name) {
            style("●").green()
        } else if partitions.is_stale(name) {
            style("○").yellow()
        } else {
            style("·").dim()
        };
        println!("  {} {}", marker, name);
    }

    Ok(())
}
