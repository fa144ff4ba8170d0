//! Resource classification
//!
//! Maps a request URL to the class that selects a caching strategy. Rules are
//! checked in order and the first match wins; anything unmatched is a
//! `Document`, which gets the conservative network-first policy.

use crate::config::schema::RoutingConfig;
use crate::fetch::FetchRequest;
use serde::Serialize;
use std::fmt;
use url::{Origin, Url};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp", "avif"];
const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "eot"];
const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs"];
const STYLE_EXTENSIONS: &[&str] = &["css"];

/// Category of a requested resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceClass {
    Image,
    Font,
    Script,
    Style,
    Document,
    /// Never intercepted
    Api,
    CrossOriginMedia,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Font => "font",
            Self::Script => "script",
            Self::Style => "style",
            Self::Document => "document",
            Self::Api => "api",
            Self::CrossOriginMedia => "cross-origin-media",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless classifier configured with the site's routing rules
#[derive(Debug, Clone)]
pub struct Classifier {
    site_origin: Origin,
    api_prefix: String,
    media_hosts: Vec<String>,
    media_path: String,
}

impl Classifier {
    pub fn new(site: &Url, routing: &RoutingConfig) -> Self {
        Self {
            site_origin: site.origin(),
            api_prefix: routing.api_prefix.clone(),
            media_hosts: routing
                .media_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            media_path: routing.media_path.clone(),
        }
    }

    pub fn classify(&self, request: &FetchRequest) -> ResourceClass {
        self.classify_url(&request.url)
    }

    pub fn classify_url(&self, url: &Url) -> ResourceClass {
        let path = url.path();

        if let Some(ext) = extension(path) {
            let ext = ext.as_str();
            if IMAGE_EXTENSIONS.contains(&ext) {
                return ResourceClass::Image;
            }
            if FONT_EXTENSIONS.contains(&ext) {
                return ResourceClass::Font;
            }
            if SCRIPT_EXTENSIONS.contains(&ext) {
                return ResourceClass::Script;
            }
            if STYLE_EXTENSIONS.contains(&ext) {
                return ResourceClass::Style;
            }
        }

        if !self.api_prefix.is_empty() && path.starts_with(&self.api_prefix) {
            return ResourceClass::Api;
        }

        if self.is_cms_media(url) {
            return ResourceClass::CrossOriginMedia;
        }

        ResourceClass::Document
    }

    fn is_cms_media(&self, url: &Url) -> bool {
        if url.origin() == self.site_origin {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        self.media_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
            && url.path().starts_with(&self.media_path)
    }
}

/// Lowercased extension of the final path segment
fn extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}
