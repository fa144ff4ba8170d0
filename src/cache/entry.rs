//! Stored cache entries and their normalized keys

use crate::fetch::{FetchRequest, FetchResponse};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// Hex-encoded sha256 of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Headers that belong to one client and are never persisted
fn is_private(name: &HeaderName) -> bool {
    *name == SET_COOKIE
}

/// Normalized request identity: method plus URL without fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn new(method: &Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self(format!("{} {}", method.as_str(), url))
    }

    pub fn from_request(request: &FetchRequest) -> Self {
        Self::new(&request.method, &request.url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename-safe digest of the key
    pub fn digest(&self) -> String {
        sha256_hex(self.0.as_bytes())
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata persisted next to an entry body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMeta {
    pub key: RequestKey,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// When the response was retrieved from the network
    pub cached_at: DateTime<Utc>,
    pub body_sha256: String,
    pub size: u64,
}

/// A response as persisted in a partition
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub meta: EntryMeta,
    pub body: Bytes,
}

impl StoredResponse {
    /// Snapshot a response for storage, leaving out per-client headers
    pub fn capture(key: RequestKey, response: &FetchResponse) -> Self {
        let headers = response
            .headers
            .iter()
            .filter(|(name, _)| !is_private(name))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            meta: EntryMeta {
                key,
                status: response.status.as_u16(),
                headers,
                cached_at: Utc::now(),
                body_sha256: sha256_hex(&response.body),
                size: response.body.len() as u64,
            },
            body: response.body.clone(),
        }
    }

    /// Whether the body matches the digest recorded at write time
    pub fn verify(&self) -> bool {
        sha256_hex(&self.body) == self.meta.body_sha256
    }

    /// Rebuild a servable response, skipping headers that no longer parse
    pub fn to_response(&self) -> FetchResponse {
        let mut headers = HeaderMap::with_capacity(self.meta.headers.len());
        for (name, value) in &self.meta.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }

        FetchResponse {
            status: StatusCode::from_u16(self.meta.status).unwrap_or(StatusCode::OK),
            headers,
            body: self.body.clone(),
        }
    }
}
