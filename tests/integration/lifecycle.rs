use crate::support::{mount, site, url, Harness};
use offgrid::engine::{BootReport, LifecycleState, ResourceClass};
use offgrid::fetch::FetchRequest;
use offgrid::OffgridError;

#[tokio::test]
async fn activation_of_v2_leaves_only_its_runtime_cache() {
    let server = site().await;
    let harness = Harness::new();

    let v1 = harness.boot(&server, "v1").await;
    v1.on_request(&FetchRequest::get(url(&server, "/app.js"))).await;
    let foreign = harness.dir.path().join("partitions").join("user-notes");
    std::fs::create_dir_all(&foreign).unwrap();

    let v2 = harness.boot(&server, "v2").await;
    assert_eq!(v2.version(), "v2");
    v2.on_request(&FetchRequest::get(url(&server, "/app.js"))).await;

    assert_eq!(
        v2.partition_for(ResourceClass::Script).name(),
        "runtime-cache-v2"
    );

    let cache = harness
        .lifecycle(&harness.config(&server, "v2"))
        .cache()
        .list_partition_names()
        .await
        .unwrap();
    let runtime: Vec<&String> = cache
        .iter()
        .filter(|n| n.starts_with("runtime-cache-"))
        .collect();
    assert_eq!(runtime, vec!["runtime-cache-v2"]);
    assert!(!cache.iter().any(|n| n.ends_with("-v1")));
    assert!(foreign.exists());
}

#[tokio::test]
async fn restart_resumes_without_refetching_manifest() {
    let server = site().await;
    let harness = Harness::new();
    harness.boot(&server, "v1").await;
    let requests = server.received_requests().await.unwrap().len();

    let restarted = Harness {
        dir: harness.dir,
        network: harness.network,
        clients: offgrid::engine::ClientRegistry::new(),
    };
    let report = restarted
        .lifecycle(&restarted.config(&server, "v1"))
        .boot()
        .await
        .unwrap();

    assert!(matches!(report, BootReport::Resumed { .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), requests);
    assert_eq!(restarted.clients.controller().unwrap().version(), "v1");
}

#[tokio::test]
async fn failed_install_keeps_previous_version() {
    let server = site().await;
    let harness = Harness::new();
    harness.boot(&server, "v1").await;

    // The origin loses its offline document before v2 installs
    server.reset().await;
    mount(&server, "/", "<h1>home</h1>", "text/html").await;
    mount(&server, "/placeholder.svg", "<svg>placeholder</svg>", "image/svg+xml").await;
    mount(&server, "/fonts/inter.woff2", "woff2", "font/woff2").await;

    let lifecycle = harness.lifecycle(&harness.config(&server, "v2"));
    let report = lifecycle.boot().await.unwrap();

    match &report {
        BootReport::KeptPrevious { serving, error } => {
            assert_eq!(serving, "v1");
            assert!(matches!(error, OffgridError::InstallFailed { .. }));
        }
        other => panic!("expected previous version to keep serving, got {:?}", other),
    }
    assert_eq!(harness.clients.controller().unwrap().version(), "v1");

    let record = lifecycle.record().await.unwrap().unwrap();
    assert_eq!(record.state, LifecycleState::Redundant);
    assert_eq!(record.active_version.as_deref(), Some("v1"));

    harness.network.set_offline(true);
    let engine = harness.clients.controller().unwrap();
    let fallback = engine
        .on_request(&FetchRequest::navigate(url(&server, "/anything")))
        .await;
    match fallback {
        offgrid::engine::Interception::Handled(r) => {
            assert_eq!(&r.response.body[..], b"<h1>offline</h1>")
        }
        other => panic!("expected handled, got {:?}", other),
    }
}

#[tokio::test]
async fn first_install_failure_is_an_error() {
    let server = site().await;
    let harness = Harness::new();
    harness.network.set_offline(true);

    let result = harness
        .lifecycle(&harness.config(&server, "v1"))
        .boot()
        .await;
    assert!(matches!(result, Err(OffgridError::InstallFailed { .. })));
    assert!(harness.clients.controller().is_none());
}

#[tokio::test]
async fn record_is_persisted_next_to_partitions() {
    let server = site().await;
    let harness = Harness::new();
    harness.boot(&server, "v1").await;

    let path = harness.dir.path().join("partitions").join("controller.json");
    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(record["state"], "active");
    assert_eq!(record["active_version"], "v1");
    assert_eq!(record["precached"], 3);
}

#[tokio::test]
async fn manual_install_then_activate() {
    let server = site().await;
    let harness = Harness::new();
    let lifecycle = harness.lifecycle(&harness.config(&server, "v1"));

    let install = lifecycle.on_install().await.unwrap();
    assert_eq!(install.precached, 3);
    assert_eq!(install.fonts_cached, 1);
    assert!(harness.clients.controller().is_none());

    let client = harness.clients.connect();
    let activate = lifecycle.on_activate().await.unwrap();
    assert!(activate.deleted.is_empty());
    assert_eq!(activate.clients_claimed, 1);
    assert_eq!(client.controller().unwrap().version(), "v1");
}
