//! Partitions command - inspect cache partitions

use crate::cache::{EntryMeta, PartitionId, PartitionSet};
use crate::cli::args::{OutputFormat, PartitionsAction, PartitionsArgs};
use crate::config::Config;
use crate::engine::Lifecycle;
use crate::error::OffgridResult;
use console::style;
use serde::Serialize;

/// Execute the partitions command
pub async fn execute(args: PartitionsArgs, config: &Config) -> OffgridResult<()> {
    let lifecycle = Lifecycle::from_config(config)?;

    match args.action {
        PartitionsAction::List { format } => list_partitions(&lifecycle, format).await,
        PartitionsAction::Show { name, format } => show_partition(&lifecycle, &name, format).await,
    }
}

#[derive(Serialize)]
struct PartitionRow {
    name: String,
    version: Option<String>,
    status: &'static str,
    entries: usize,
    bytes: u64,
}

async fn list_partitions(lifecycle: &Lifecycle, format: OutputFormat) -> OffgridResult<()> {
    let names = lifecycle.cache().list_partition_names().await?;
    let current = PartitionSet::new(lifecycle.version());

    let mut rows = Vec::with_capacity(names.len());
    for name in names {
        let entries = lifecycle.cache().named(&name)?.entries().await?;
        let status = if current.owns(&name) {
            "current"
        } else if current.is_stale(&name) {
            "stale"
        } else {
            "foreign"
        };
        rows.push(PartitionRow {
            version: PartitionId::parse(&name).map(|id| id.version),
            bytes: entries.iter().map(|e| e.size).sum(),
            entries: entries.len(),
            status,
            name,
        });
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No partitions found.");
                return Ok(());
            }
            println!(
                "{:<28} {:<10} {:<10} {:>8} {:>12}",
                "PARTITION", "VERSION", "STATUS", "ENTRIES", "BYTES"
            );
            println!("{}", "-".repeat(72));
            for row in &rows {
                let status = match row.status {
                    "current" => style(row.status).green().to_string(),
                    "stale" => style(row.status).yellow().to_string(),
                    _ => style(row.status).dim().to_string(),
                };
                println!(
                    "{:<28} {:<10} {:<10} {:>8} {:>12}",
                    row.name,
                    row.version.as_deref().unwrap_or("-"),
                    status,
                    row.entries,
                    row.bytes
                );
            }
            println!();
            println!("Total: {} partition(s)", rows.len());
        }
    }

    Ok(())
}

async fn show_partition(lifecycle: &Lifecycle, name: &str, format: OutputFormat) -> OffgridResult<()> {
    let entries: Vec<EntryMeta> = lifecycle.cache().named(name)?.entries().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}", entry.key);
            }
        }
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("No entries in {}.", name);
                return Ok(());
            }
            println!(
                "{:<60} {:>6} {:>10} {:<20}",
                "KEY", "STATUS", "BYTES", "CACHED"
            );
            println!("{}", "-".repeat(100));
            for entry in &entries {
                println!(
                    "{:<60} {:>6} {:>10} {:<20}",
                    entry.key.as_str(),
                    entry.status,
                    entry.size,
                    entry.cached_at.format("%Y-%m-%d %H:%M")
                );
            }
            println!();
            println!("Total: {} entries", entries.len());
        }
    }

    Ok(())
}
