//! Request and response values exchanged with the network and the cache

use crate::error::{OffgridError, OffgridResult};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONNECTION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use url::Url;

/// Headers that only apply to a single transport hop
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// How the browsing context issued a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Full-page document navigation
    Navigate,
    /// Any other fetch (images, scripts, XHR, ...)
    Subresource,
}

impl RequestMode {
    /// Derive the mode from request headers
    ///
    /// `Sec-Fetch-Mode` is authoritative when present. Without it, a GET whose
    /// `Accept` header leads with `text/html` is treated as a navigation.
    pub fn from_headers(method: &Method, headers: &HeaderMap) -> Self {
        if let Some(mode) = headers
            .get("sec-fetch-mode")
            .and_then(|v| v.to_str().ok())
        {
            return if mode.trim().eq_ignore_ascii_case("navigate") {
                Self::Navigate
            } else {
                Self::Subresource
            };
        }

        let prefers_html = headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .and_then(|accept| accept.split(',').next())
            .map(|first| first.split(';').next().unwrap_or("").trim())
            .is_some_and(|media| media.eq_ignore_ascii_case("text/html"));

        if *method == Method::GET && prefers_html {
            Self::Navigate
        } else {
            Self::Subresource
        }
    }
}

/// An outbound request seen by the engine
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl FetchRequest {
    /// Create a subresource request
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            mode: RequestMode::Subresource,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Create a GET subresource request
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a GET navigation request
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_mode(RequestMode::Navigate)
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Whether this is a GET request
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Whether this is a full-page navigation
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// A response from the network, the cache, or a fallback
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchResponse {
    /// Create a response with no headers
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Synthetic terminal response used when nothing else can be served
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Resource not found")
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Resolve a request target against the site origin
///
/// Absolute targets are returned as-is so cross-origin requests keep their host.
pub fn resolve_target(origin: &Url, target: &str) -> OffgridResult<Url> {
    let resolved = match Url::parse(target) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => origin.join(target).map_err(|e| {
            OffgridError::InvalidUrl {
                url: target.to_string(),
                reason: e.to_string(),
            }
        })?,
        Err(e) => {
            return Err(OffgridError::InvalidUrl {
                url: target.to_string(),
                reason: e.to_string(),
            })
        }
    };

    if !matches!(resolved.scheme(), "http" | "https") {
        return Err(OffgridError::InvalidUrl {
            url: target.to_string(),
            reason: format!("unsupported scheme {}", resolved.scheme()),
        });
    }
    Ok(resolved)
}

/// Copy headers, dropping hop-by-hop ones
///
/// Besides the fixed set, any header named in a `Connection` value is
/// connection-scoped and dropped too.
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<String> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name_str = name.as_str();
        if !HOP_BY_HOP.contains(&name_str) && !listed.iter().any(|t| t == name_str) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}
