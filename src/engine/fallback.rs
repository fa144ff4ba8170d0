//! Terminal degradation chain
//!
//! Invoked once both network and cache have failed. Navigations get the
//! offline document, images get the placeholder, everything else (or a
//! missing fallback asset) gets a synthetic 404. The resolver cannot fail.

use crate::cache::Partition;
use crate::engine::classify::ResourceClass;
use crate::engine::strategy::StrategyOutcome;
use crate::fetch::{FetchRequest, FetchResponse};
use tracing::{debug, warn};
use url::Url;

/// Degradation steps backed by the precache partition
#[derive(Clone)]
pub struct FallbackResolver {
    precache: Partition,
    offline_document: Option<Url>,
    placeholder_image: Option<Url>,
}

impl FallbackResolver {
    pub fn new(
        precache: Partition,
        offline_document: Option<Url>,
        placeholder_image: Option<Url>,
    ) -> Self {
        Self {
            precache,
            offline_document,
            placeholder_image,
        }
    }

    /// Produce the best available substitute response
    pub async fn resolve(
        &self,
        request: &FetchRequest,
        class: ResourceClass,
    ) -> (StrategyOutcome, FetchResponse) {
        let designated = if request.is_navigation() {
            self.offline_document.as_ref()
        } else if class == ResourceClass::Image {
            self.placeholder_image.as_ref()
        } else {
            None
        };

        if let Some(asset) = designated {
            if let Some(response) = self.precache.lookup(&FetchRequest::get(asset.clone())).await {
                debug!(url = %request.url, fallback = %asset, "Serving fallback asset");
                return (StrategyOutcome::ServedFromFallback, response);
            }
            warn!(fallback = %asset, partition = self.precache.name(), "Fallback asset missing from precache");
        }

        debug!(url = %request.url, %class, "No fallback available, synthesizing not-found");
        (StrategyOutcome::Failed, FetchResponse::not_found())
    }
}
