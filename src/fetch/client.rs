//! Network client abstraction
//!
//! The engine only ever talks to the network through [`Fetcher`], so tests
//! and alternate transports can stand in for the reqwest-backed client.

use crate::error::{OffgridError, OffgridResult};
use crate::fetch::message::{strip_hop_by_hop, FetchRequest, FetchResponse};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Fetch-capable network client
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue the request, resolving to any HTTP response or a network error
    async fn fetch(&self, request: &FetchRequest) -> OffgridResult<FetchResponse>;
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given per-request timeout
    pub fn new(timeout: Duration) -> OffgridResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| OffgridError::Internal(format!("building HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> OffgridResult<FetchResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(strip_hop_by_hop(&request.headers));
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| OffgridError::network(request.url.as_str(), e))?;

        let status = response.status();
        let headers = strip_hop_by_hop(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| OffgridError::network(request.url.as_str(), e))?;

        debug!(url = %request.url, %status, bytes = body.len(), "fetched");
        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}
