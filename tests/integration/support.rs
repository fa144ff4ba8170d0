//! Shared fixtures: a mock origin site and a switchable network

use async_trait::async_trait;
use offgrid::audit::AuditLog;
use offgrid::cache::CacheManager;
use offgrid::config::schema::StorageKind;
use offgrid::config::Config;
use offgrid::engine::{ClientRegistry, Engine, Lifecycle, RecordStore};
use offgrid::fetch::{FetchRequest, FetchResponse, Fetcher, HttpFetcher};
use offgrid::{OffgridError, OffgridResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Real HTTP client that can be cut off from the network
pub struct Switch {
    inner: HttpFetcher,
    offline: AtomicBool,
}

impl Switch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: HttpFetcher::new(Duration::from_secs(5)).unwrap(),
            offline: AtomicBool::new(false),
        })
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for Switch {
    async fn fetch(&self, request: &FetchRequest) -> OffgridResult<FetchResponse> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(OffgridError::network(request.url.as_str(), "network unreachable"));
        }
        self.inner.fetch(request).await
    }
}

pub async fn mount(server: &MockServer, route: &str, body: &str, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", content_type),
        )
        .mount(server)
        .await;
}

/// Origin serving a small site
pub async fn site() -> MockServer {
    let server = MockServer::start().await;
    mount(&server, "/", "<h1>home</h1>", "text/html").await;
    mount(&server, "/offline.html", "<h1>offline</h1>", "text/html").await;
    mount(&server, "/placeholder.svg", "<svg>placeholder</svg>", "image/svg+xml").await;
    mount(&server, "/fonts/inter.woff2", "woff2", "font/woff2").await;
    mount(&server, "/hero.png", "hero-v1", "image/png").await;
    mount(&server, "/app.js", "console.log(1)", "application/javascript").await;
    mount(&server, "/blog/post", "<h1>post</h1>", "text/html").await;
    mount(&server, "/api/posts", "[]", "application/json").await;
    server
}

pub fn config(origin: &str, version: &str, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.general.audit_log = false;
    config.origin.url = origin.to_string();
    config.cache.dir = Some(dir.path().join("partitions"));
    config.cache.storage = StorageKind::File;
    config.cache.version = version.to_string();
    config.precache.manifest = vec!["/".to_string()];
    config.precache.offline_document = Some("/offline.html".to_string());
    config.precache.placeholder_image = Some("/placeholder.svg".to_string());
    config.precache.fonts = vec!["/fonts/inter.woff2".to_string()];
    config
}

/// Durable state in a temp dir plus the network switch
pub struct Harness {
    pub dir: TempDir,
    pub network: Arc<Switch>,
    pub clients: ClientRegistry,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            network: Switch::new(),
            clients: ClientRegistry::new(),
        }
    }

    pub fn config(&self, server: &MockServer, version: &str) -> Config {
        config(&server.uri(), version, &self.dir)
    }

    /// Lifecycle over this harness's storage, as a fresh process would build it
    pub fn lifecycle(&self, config: &Config) -> Lifecycle {
        Lifecycle::new(
            config.clone(),
            CacheManager::from_config(config),
            self.network.clone(),
            RecordStore::from_config(config),
            self.clients.clone(),
            AuditLog::disabled(),
        )
    }

    /// Boot `version` against `server` and return the controlling engine
    pub async fn boot(&self, server: &MockServer, version: &str) -> Arc<Engine> {
        self.lifecycle(&self.config(server, version))
            .boot()
            .await
            .unwrap();
        self.clients.controller().unwrap()
    }
}

pub fn url(server: &MockServer, path: &str) -> Url {
    Url::parse(&server.uri()).unwrap().join(path).unwrap()
}
