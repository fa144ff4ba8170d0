//! Serve command - boot the lifecycle and run the proxy

use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::engine::{BootReport, Lifecycle};
use crate::error::{OffgridError, OffgridResult};
use crate::proxy::{self, ProxyState};
use console::style;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: &Config) -> OffgridResult<()> {
    let mut config = config.clone();
    if let Some(upstream) = args.upstream {
        config.origin.url = upstream;
    }
    let listen = args.listen.unwrap_or_else(|| config.server.listen.clone());

    let origin = Url::parse(&config.origin.url).map_err(|e| OffgridError::InvalidUrl {
        url: config.origin.url.clone(),
        reason: e.to_string(),
    })?;

    let lifecycle = Lifecycle::from_config(&config)?;
    // Connect before booting so activation claims the proxy
    let client = lifecycle.clients().connect();
    let report = lifecycle.boot().await?;
    print_boot(&report);

    let state = Arc::new(ProxyState {
        client,
        fetcher: lifecycle.fetcher(),
        origin,
    });

    println!(
        "{} Proxying {} on {}",
        style("→").cyan(),
        style(&state.origin).bold(),
        style(&listen).bold()
    );
    proxy::serve(&listen, state).await?;
    debug!("Proxy stopped");
    Ok(())
}

fn print_boot(report: &BootReport) {
    match report {
        BootReport::Resumed { version } => {
            println!("{} Resumed {}", style("✓").green(), style(version).bold());
        }
        BootReport::Activated { install, activate } => {
            if let Some(install) = install {
                println!(
                    "{} Installed {} ({} precached, {} fonts)",
                    style("✓").green(),
                    style(&install.version).bold(),
                    install.precached,
                    install.fonts_cached
                );
            }
            println!(
                "{} Activated {} ({} stale partitions removed)",
                style("✓").green(),
                style(&activate.version).bold(),
                activate.deleted.len()
            );
        }
        BootReport::Waiting { serving, .. } => {
            println!(
                "{} New version waiting; {} keeps serving",
                style("⚠").yellow(),
                style(serving).bold()
            );
        }
        BootReport::KeptPrevious { serving, error } => {
            println!(
                "{} Install failed: {}; {} keeps serving",
                style("✗").red(),
                error,
                style(serving).bold()
            );
        }
    }
}
