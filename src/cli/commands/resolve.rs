//! Resolve command - push one request through the active version

use crate::cli::args::ResolveArgs;
use crate::config::Config;
use crate::engine::{Interception, Lifecycle};
use crate::error::{OffgridError, OffgridResult};
use crate::fetch::{resolve_target, FetchRequest, FetchResponse, RequestMode};
use console::style;
use reqwest::Method;
use tracing::warn;

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config) -> OffgridResult<()> {
    let lifecycle = Lifecycle::from_config(config)?;
    let engine = lifecycle.active_engine().await?;

    let url = resolve_target(engine.site(), &args.url)?;
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .map_err(|_| OffgridError::User(format!("Invalid method: {}", args.method)))?;
    let mode = if args.navigate {
        RequestMode::Navigate
    } else {
        RequestMode::Subresource
    };
    let request = FetchRequest::new(method, url).with_mode(mode);

    let (class, outcome, response) = match engine.on_request(&request).await {
        Interception::Handled(resolution) => {
            if let Some(revalidation) = resolution.revalidation {
                // Let the background refresh land before the process exits
                if let Err(e) = revalidation.await {
                    warn!(error = %e, "Revalidation task failed");
                }
            }
            (
                resolution.class,
                resolution.outcome.to_string(),
                resolution.response,
            )
        }
        Interception::Passthrough(class) => {
            let response = lifecycle.fetcher().fetch(&request).await?;
            (class, "passthrough".to_string(), response)
        }
    };

    print_resolution(&request, &class.to_string(), &outcome, &response);
    if args.body {
        println!();
        println!("{}", String::from_utf8_lossy(&response.body));
    }
    Ok(())
}

fn print_resolution(request: &FetchRequest, class: &str, outcome: &str, response: &FetchResponse) {
    let status = if response.is_success() {
        style(response.status.to_string()).green()
    } else {
        style(response.status.to_string()).red()
    };

    println!("{} {}", style(&request.method).bold(), request.url);
    println!("  Class:    {}", class);
    println!("  Outcome:  {}", style(outcome).cyan());
    println!("  Status:   {}", status);
    println!("  Bytes:    {}", response.body.len());
    if let Some(content_type) = response.content_type() {
        println!("  Type:     {}", content_type);
    }
}
