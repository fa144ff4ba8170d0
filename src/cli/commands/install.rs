//! Install command - precache the configured version

use crate::config::Config;
use crate::engine::Lifecycle;
use crate::error::OffgridResult;
use console::style;

/// Execute the install command
pub async fn execute(config: &Config) -> OffgridResult<()> {
    let lifecycle = Lifecycle::from_config(config)?;
    let report = lifecycle.on_install().await?;

    println!(
        "{} Installed {}",
        style("✓").green(),
        style(&report.version).bold()
    );
    println!("  Precached: {}", report.precached);
    println!("  Fonts:     {}", report.fonts_cached);

    if !report.failed.is_empty() {
        println!();
        println!("{}", style("Skipped entries:").yellow());
        for entry in &report.failed {
            println!("  {} {} ({})", style("•").yellow(), entry.path, entry.reason);
        }
    }

    println!();
    println!("Run {} to take over clients", style("offgrid activate").cyan());
    Ok(())
}
