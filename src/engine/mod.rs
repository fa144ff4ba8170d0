//! Cache strategy engine
//!
//! Per request: classify, pick a strategy, run it against the class's
//! partition, and fall back when network and cache both come up empty.
//! Non-GET and API traffic is handed back to the caller untouched.

pub mod classify;
pub mod clients;
pub mod fallback;
pub mod lifecycle;
pub mod state;
pub mod strategy;

pub use classify::{Classifier, ResourceClass};
pub use clients::{Client, ClientRegistry};
pub use fallback::FallbackResolver;
pub use lifecycle::{ActivateReport, BootReport, InstallReport, Lifecycle};
pub use state::{ControllerRecord, LifecycleState, RecordStore};
pub use strategy::{Executor, Resolution, Strategy, StrategyOutcome};

use crate::cache::{CacheManager, Partition, PartitionSet};
use crate::config::Config;
use crate::error::{OffgridError, OffgridResult};
use crate::fetch::{resolve_target, FetchRequest, Fetcher};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// What the engine did with a request
#[derive(Debug)]
pub enum Interception {
    /// Not intercepted; the caller forwards the request to the network itself
    Passthrough(ResourceClass),
    /// Answered by the engine
    Handled(Resolution),
}

/// Request handler for one active version
pub struct Engine {
    site: Url,
    partitions: PartitionSet,
    classifier: Classifier,
    cache: CacheManager,
    fetcher: Arc<dyn Fetcher>,
    fallback: FallbackResolver,
}

impl Engine {
    /// Build the engine for `version` using the configured routing and fallbacks
    pub fn new(
        config: &Config,
        version: impl Into<String>,
        cache: CacheManager,
        fetcher: Arc<dyn Fetcher>,
    ) -> OffgridResult<Self> {
        let site = Url::parse(&config.origin.url).map_err(|e| OffgridError::InvalidUrl {
            url: config.origin.url.clone(),
            reason: e.to_string(),
        })?;
        let partitions = PartitionSet::new(version);

        let offline_document = config
            .precache
            .offline_document
            .as_deref()
            .map(|path| resolve_target(&site, path))
            .transpose()?;
        let placeholder_image = config
            .precache
            .placeholder_image
            .as_deref()
            .map(|path| resolve_target(&site, path))
            .transpose()?;

        let fallback = FallbackResolver::new(
            cache.partition(&partitions.precache()),
            offline_document,
            placeholder_image,
        );

        Ok(Self {
            classifier: Classifier::new(&site, &config.routing),
            site,
            partitions,
            cache,
            fetcher,
            fallback,
        })
    }

    pub fn version(&self) -> &str {
        self.partitions.version()
    }

    pub fn site(&self) -> &Url {
        &self.site
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn partitions(&self) -> &PartitionSet {
        &self.partitions
    }

    /// Partition that holds responses of a class
    pub fn partition_for(&self, class: ResourceClass) -> Partition {
        let id = match class {
            ResourceClass::Font => self.partitions.fonts(),
            ResourceClass::CrossOriginMedia => self.partitions.media(),
            _ => self.partitions.runtime(),
        };
        self.cache.partition(&id)
    }

    /// Handle an intercepted request
    pub async fn on_request(&self, request: &FetchRequest) -> Interception {
        let class = self.classifier.classify(request);

        if !request.is_get() {
            debug!(method = %request.method, url = %request.url, "Not intercepting non-GET request");
            return Interception::Passthrough(class);
        }

        let Some(strategy) = Strategy::for_class(class) else {
            debug!(url = %request.url, %class, "Passing request through");
            return Interception::Passthrough(class);
        };

        let partition = self.partition_for(class);
        let resolution = Executor::new(&self.fetcher, &self.fallback)
            .execute(strategy, request, class, &partition)
            .await;

        debug!(
            url = %request.url,
            %class,
            outcome = %resolution.outcome,
            status = %resolution.response.status,
            "Resolved request"
        );
        Interception::Handled(resolution)
    }
}
