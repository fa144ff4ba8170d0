use crate::support::{mount, site, url, Harness};
use offgrid::engine::{Interception, Resolution, ResourceClass, StrategyOutcome};
use offgrid::fetch::FetchRequest;
use reqwest::{Method, StatusCode};
use wiremock::MockServer;

fn handled(interception: Interception) -> Resolution {
    match interception {
        Interception::Handled(resolution) => resolution,
        Interception::Passthrough(class) => panic!("expected handled, got passthrough ({})", class),
    }
}

#[tokio::test]
async fn api_traffic_is_never_cached() {
    let server = site().await;
    let harness = Harness::new();
    let engine = harness.boot(&server, "v1").await;

    let request = FetchRequest::get(url(&server, "/api/posts"));
    let result = engine.on_request(&request).await;
    assert!(matches!(result, Interception::Passthrough(ResourceClass::Api)));

    let entries = engine
        .partition_for(ResourceClass::Api)
        .entries()
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn cache_first_serves_offline_repeatedly() {
    let server = site().await;
    let harness = Harness::new();
    let engine = harness.boot(&server, "v1").await;
    let request = FetchRequest::get(url(&server, "/hero.png"));

    let first = handled(engine.on_request(&request).await);
    assert_eq!(first.outcome, StrategyOutcome::ServedFromNetwork);

    harness.network.set_offline(true);
    for _ in 0..3 {
        let r = handled(engine.on_request(&request).await);
        assert_eq!(r.outcome, StrategyOutcome::ServedFromCache);
        assert_eq!(&r.response.body[..], b"hero-v1");
        if let Some(revalidation) = r.revalidation {
            revalidation.await.unwrap();
        }
    }
}

#[tokio::test]
async fn network_first_degrades_to_stale_then_offline_document() {
    let server = site().await;
    let harness = Harness::new();
    let engine = harness.boot(&server, "v1").await;

    let visited = FetchRequest::navigate(url(&server, "/blog/post"));
    let online = handled(engine.on_request(&visited).await);
    assert_eq!(online.outcome, StrategyOutcome::ServedFromNetwork);

    harness.network.set_offline(true);

    let stale = handled(engine.on_request(&visited).await);
    assert_eq!(stale.outcome, StrategyOutcome::ServedFromCache);
    assert_eq!(&stale.response.body[..], b"<h1>post</h1>");

    let unseen = FetchRequest::navigate(url(&server, "/blog/unseen"));
    let fallback = handled(engine.on_request(&unseen).await);
    assert_eq!(fallback.outcome, StrategyOutcome::ServedFromFallback);
    assert_eq!(&fallback.response.body[..], b"<h1>offline</h1>");
}

#[tokio::test]
async fn network_first_uses_cache_on_server_error() {
    let server = site().await;
    let harness = Harness::new();
    let engine = harness.boot(&server, "v1").await;
    let request = FetchRequest::get(url(&server, "/app.js"));
    handled(engine.on_request(&request).await);

    server.reset().await;
    wiremock::Mock::given(wiremock::matchers::path("/app.js"))
        .respond_with(wiremock::ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let r = handled(engine.on_request(&request).await);
    assert_eq!(r.outcome, StrategyOutcome::ServedFromCache);
    assert_eq!(&r.response.body[..], b"console.log(1)");
}

#[tokio::test]
async fn fallback_is_terminal() {
    let server = site().await;
    let harness = Harness::new();
    let engine = harness.boot(&server, "v1").await;
    harness.network.set_offline(true);

    let image = handled(
        engine
            .on_request(&FetchRequest::get(url(&server, "/never/seen.jpg")))
            .await,
    );
    assert_eq!(image.outcome, StrategyOutcome::ServedFromFallback);
    assert_eq!(&image.response.body[..], b"<svg>placeholder</svg>");

    let script = handled(
        engine
            .on_request(&FetchRequest::get(url(&server, "/never/seen.js")))
            .await,
    );
    assert_eq!(script.outcome, StrategyOutcome::Failed);
    assert_eq!(script.response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_is_never_looked_up_or_written() {
    let server = site().await;
    let harness = Harness::new();
    let engine = harness.boot(&server, "v1").await;

    let post = FetchRequest::new(Method::POST, url(&server, "/hero.png"));
    assert!(matches!(
        engine.on_request(&post).await,
        Interception::Passthrough(ResourceClass::Image)
    ));
    let entries = engine
        .partition_for(ResourceClass::Image)
        .entries()
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn revalidation_refreshes_entry_after_response() {
    let server: MockServer = site().await;
    let harness = Harness::new();
    let engine = harness.boot(&server, "v1").await;
    let request = FetchRequest::get(url(&server, "/hero.png"));
    handled(engine.on_request(&request).await);

    server.reset().await;
    mount(&server, "/hero.png", "hero-v2", "image/png").await;

    let hit = handled(engine.on_request(&request).await);
    assert_eq!(hit.outcome, StrategyOutcome::ServedFromCache);
    assert_eq!(&hit.response.body[..], b"hero-v1");
    hit.revalidation.expect("image hits revalidate").await.unwrap();

    let refreshed = handled(engine.on_request(&request).await);
    assert_eq!(refreshed.outcome, StrategyOutcome::ServedFromCache);
    assert_eq!(&refreshed.response.body[..], b"hero-v2");
}

#[tokio::test]
async fn fonts_come_from_precache_without_network() {
    let server = site().await;
    let harness = Harness::new();
    let engine = harness.boot(&server, "v1").await;
    harness.network.set_offline(true);

    let r = handled(
        engine
            .on_request(&FetchRequest::get(url(&server, "/fonts/inter.woff2")))
            .await,
    );
    assert_eq!(r.outcome, StrategyOutcome::ServedFromCache);
    assert_eq!(&r.response.body[..], b"woff2");
}
