//! Activate command - switch clients to the installed version

use crate::config::Config;
use crate::engine::Lifecycle;
use crate::error::OffgridResult;
use console::style;

/// Execute the activate command
pub async fn execute(config: &Config) -> OffgridResult<()> {
    let lifecycle = Lifecycle::from_config(config)?;
    let report = lifecycle.on_activate().await?;

    println!(
        "{} Activated {}",
        style("✓").green(),
        style(&report.version).bold()
    );

    if report.deleted.is_empty() {
        println!("  No stale partitions");
    }
    for name in &report.deleted {
        println!("  {} removed {}", style("-").red(), name);
    }
    for name in &report.retained {
        println!("  {} could not remove {}", style("⚠").yellow(), name);
    }

    Ok(())
}
