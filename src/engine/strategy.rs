//! Cache-first and network-first executors

use crate::cache::Partition;
use crate::engine::classify::ResourceClass;
use crate::engine::fallback::FallbackResolver;
use crate::fetch::{FetchRequest, FetchResponse, Fetcher};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// How a request was ultimately answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyOutcome {
    ServedFromCache,
    ServedFromNetwork,
    ServedFromFallback,
    /// Chain exhausted; the synthetic not-found response was served
    Failed,
}

impl StrategyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServedFromCache => "cache",
            Self::ServedFromNetwork => "network",
            Self::ServedFromFallback => "fallback",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for StrategyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-resolution algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve stored responses first; optionally refresh them in the background
    CacheFirst { revalidate: bool },
    /// Prefer the live network; stored responses are the fallback
    NetworkFirst,
}

impl Strategy {
    /// Strategy for a class, or `None` for traffic that is never intercepted
    pub fn for_class(class: ResourceClass) -> Option<Self> {
        match class {
            ResourceClass::Image | ResourceClass::Font => {
                Some(Self::CacheFirst { revalidate: true })
            }
            ResourceClass::CrossOriginMedia => Some(Self::CacheFirst { revalidate: false }),
            ResourceClass::Script | ResourceClass::Style | ResourceClass::Document => {
                Some(Self::NetworkFirst)
            }
            ResourceClass::Api => None,
        }
    }
}

/// Result of running a strategy
#[derive(Debug)]
pub struct Resolution {
    pub class: ResourceClass,
    pub outcome: StrategyOutcome,
    pub response: FetchResponse,
    /// Background revalidation; dropping the handle detaches the task
    pub revalidation: Option<JoinHandle<()>>,
}

/// Collaborators shared by both executors
pub struct Executor<'a> {
    fetcher: &'a Arc<dyn Fetcher>,
    fallback: &'a FallbackResolver,
}

impl<'a> Executor<'a> {
    pub fn new(fetcher: &'a Arc<dyn Fetcher>, fallback: &'a FallbackResolver) -> Self {
        Self { fetcher, fallback }
    }

    pub async fn execute(
        &self,
        strategy: Strategy,
        request: &FetchRequest,
        class: ResourceClass,
        partition: &Partition,
    ) -> Resolution {
        match strategy {
            Strategy::CacheFirst { revalidate } => {
                self.cache_first(request, class, partition, revalidate).await
            }
            Strategy::NetworkFirst => self.network_first(request, class, partition).await,
        }
    }

    pub async fn cache_first(
        &self,
        request: &FetchRequest,
        class: ResourceClass,
        partition: &Partition,
        revalidate: bool,
    ) -> Resolution {
        if let Some(cached) = partition.lookup(request).await {
            debug!(url = %request.url, partition = partition.name(), "Cache hit");
            let revalidation = revalidate.then(|| {
                spawn_revalidation(self.fetcher.clone(), partition.clone(), request.clone())
            });
            return Resolution {
                class,
                outcome: StrategyOutcome::ServedFromCache,
                response: cached,
                revalidation,
            };
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                partition.put(request, &response).await;
                Resolution {
                    class,
                    outcome: StrategyOutcome::ServedFromNetwork,
                    response,
                    revalidation: None,
                }
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Network failed on cache miss");
                self.fall_back(request, class).await
            }
        }
    }

    pub async fn network_first(
        &self,
        request: &FetchRequest,
        class: ResourceClass,
        partition: &Partition,
    ) -> Resolution {
        match self.fetcher.fetch(request).await {
            Ok(response) if response.is_success() => {
                partition.put(request, &response).await;
                return Resolution {
                    class,
                    outcome: StrategyOutcome::ServedFromNetwork,
                    response,
                    revalidation: None,
                };
            }
            Ok(response) => {
                debug!(url = %request.url, status = %response.status, "Network returned non-success")
            }
            Err(e) => debug!(url = %request.url, error = %e, "Network failed"),
        }

        if let Some(cached) = partition.lookup(request).await {
            debug!(url = %request.url, partition = partition.name(), "Serving stale cached response");
            return Resolution {
                class,
                outcome: StrategyOutcome::ServedFromCache,
                response: cached,
                revalidation: None,
            };
        }

        self.fall_back(request, class).await
    }

    async fn fall_back(&self, request: &FetchRequest, class: ResourceClass) -> Resolution {
        let (outcome, response) = self.fallback.resolve(request, class).await;
        Resolution {
            class,
            outcome,
            response,
            revalidation: None,
        }
    }
}

/// Refresh a cached entry without blocking the response path
fn spawn_revalidation(
    fetcher: Arc<dyn Fetcher>,
    partition: Partition,
    request: FetchRequest,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match fetcher.fetch(&request).await {
            Ok(response) if response.is_success() => {
                if partition.put(&request, &response).await {
                    debug!(url = %request.url, partition = partition.name(), "Revalidated cached entry");
                }
            }
            Ok(response) => {
                debug!(url = %request.url, status = %response.status, "Revalidation returned non-success, keeping entry")
            }
            Err(e) => debug!(url = %request.url, error = %e, "Revalidation failed, keeping entry"),
        }
    })
}
