use crate::support::{site, Harness};
use offgrid::proxy::{self, ProxyState, OUTCOME_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct RunningProxy {
    addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

impl RunningProxy {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn start(harness: &Harness, server: &MockServer) -> RunningProxy {
    let state = Arc::new(ProxyState {
        client: harness.clients.connect(),
        fetcher: harness.network.clone(),
        origin: Url::parse(&server.uri()).unwrap(),
    });
    let listener = proxy::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(proxy::run(listener, state, async {
        let _ = rx.await;
    }));
    RunningProxy {
        addr,
        _shutdown: tx,
    }
}

fn http() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn navigation_served_then_falls_back_offline() {
    let server = site().await;
    let harness = Harness::new();
    let proxy = start(&harness, &server).await;
    harness.boot(&server, "v1").await;

    let online = http()
        .get(proxy.url("/blog/post"))
        .header("accept", "text/html,application/xhtml+xml")
        .send()
        .await
        .unwrap();
    assert_eq!(online.status(), 200);
    assert_eq!(online.headers()[OUTCOME_HEADER], "network");
    assert_eq!(online.text().await.unwrap(), "<h1>post</h1>");

    harness.network.set_offline(true);

    let stale = http()
        .get(proxy.url("/blog/post"))
        .header("accept", "text/html")
        .send()
        .await
        .unwrap();
    assert_eq!(stale.headers()[OUTCOME_HEADER], "cache");

    let offline = http()
        .get(proxy.url("/somewhere/new"))
        .header("sec-fetch-mode", "navigate")
        .send()
        .await
        .unwrap();
    assert_eq!(offline.status(), 200);
    assert_eq!(offline.headers()[OUTCOME_HEADER], "fallback");
    assert_eq!(offline.text().await.unwrap(), "<h1>offline</h1>");
}

#[tokio::test]
async fn api_and_post_are_forwarded_untouched() {
    let server = site().await;
    Mock::given(method("POST"))
        .and(path("/api/comments"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .mount(&server)
        .await;
    let harness = Harness::new();
    let proxy = start(&harness, &server).await;
    harness.boot(&server, "v1").await;

    let api = http().get(proxy.url("/api/posts")).send().await.unwrap();
    assert_eq!(api.status(), 200);
    assert!(api.headers().get(OUTCOME_HEADER).is_none());
    assert_eq!(api.text().await.unwrap(), "[]");

    let post = http()
        .post(proxy.url("/api/comments"))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(post.status(), 201);
    assert!(post.headers().get(OUTCOME_HEADER).is_none());
}

#[tokio::test]
async fn passthrough_while_offline_is_bad_gateway() {
    let server = site().await;
    let harness = Harness::new();
    let proxy = start(&harness, &server).await;
    harness.boot(&server, "v1").await;
    harness.network.set_offline(true);

    let api = http().get(proxy.url("/api/posts")).send().await.unwrap();
    assert_eq!(api.status(), 502);
}

#[tokio::test]
async fn forwards_before_any_version_is_active() {
    let server = site().await;
    let harness = Harness::new();
    let proxy = start(&harness, &server).await;

    let response = http().get(proxy.url("/hero.png")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers().get(OUTCOME_HEADER).is_none());
    assert_eq!(response.text().await.unwrap(), "hero-v1");
}

#[tokio::test]
async fn unknown_subresource_offline_is_not_found() {
    let server = site().await;
    let harness = Harness::new();
    let proxy = start(&harness, &server).await;
    harness.boot(&server, "v1").await;
    harness.network.set_offline(true);

    let response = http().get(proxy.url("/missing.css")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(response.headers()[OUTCOME_HEADER], "failed");
}
