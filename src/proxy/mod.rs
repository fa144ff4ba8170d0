//! HTTP interception proxy
//!
//! Stands in front of the origin the way a service worker stands in front of
//! the network: browsers talk to the proxy, the active engine answers what it
//! intercepts.

pub mod handler;

pub use handler::{create_router, target_url, ProxyState, OUTCOME_HEADER};

use crate::error::{OffgridError, OffgridResult};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

/// Bind the listen address
pub async fn bind(listen: &str) -> OffgridResult<TcpListener> {
    TcpListener::bind(listen)
        .await
        .map_err(|source| OffgridError::Bind {
            addr: listen.to_string(),
            source,
        })
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn run<F>(listener: TcpListener, state: Arc<ProxyState>, shutdown: F) -> OffgridResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| OffgridError::io("reading listener address", e))?;
    info!(%addr, origin = %state.origin, "Proxy listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| OffgridError::io("serving proxy", e))
}

/// Bind and serve until interrupted
pub async fn serve(listen: &str, state: Arc<ProxyState>) -> OffgridResult<()> {
    let listener = bind(listen).await?;
    run(listener, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
