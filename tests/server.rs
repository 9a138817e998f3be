//! End-to-end tests against the demo server over a real socket.

use std::time::Duration;

use request_apm::backend::InMemoryBackend;
use request_apm::config::AppConfig;
use request_apm::server;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

async fn start(config: AppConfig, backend: &InMemoryBackend) -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = server::build_router(&config, backend);

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = server::serve(listener, router, async {
            let _ = rx.await;
        })
        .await;
    });

    (format!("http://{}", addr), tx)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn active_app_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.apm.credential = "abc".into();
    config.apm.app_name = "demo".into();
    config.apm.enabled = true;
    config.apm.transport = "HTTPS".into();
    config
}

#[tokio::test]
async fn test_health_is_instrumented() {
    let backend = InMemoryBackend::new();
    let (base, shutdown) = start(active_app_config(), &backend).await;

    let res = client().get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "ok");
    let _ = shutdown.send(());

    let record = backend.single_transaction().unwrap();
    assert_eq!(record.name, "GET /health");
    assert_eq!(record.request.unwrap().url.scheme(), "https");
    assert_eq!(record.response.unwrap().status.map(|s| s.as_u16()), Some(200));
    assert_eq!(record.end_count, 1);
}

#[tokio::test]
async fn test_user_route_labels_and_spans() {
    let backend = InMemoryBackend::new();
    let (base, shutdown) = start(active_app_config(), &backend).await;

    let res = client().get(format!("{}/users/7", base)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["id"], 7);
    let _ = shutdown.send(());

    let record = backend.single_transaction().unwrap();
    assert_eq!(record.name, "GET /users/7");
    assert_eq!(record.attributes, vec![("labels.user_id".to_string(), "7".to_string())]);
    assert_eq!(record.segments_ended, vec!["db.query"]);
}

#[tokio::test]
async fn test_failing_route_keeps_status() {
    let backend = InMemoryBackend::new();
    let (base, shutdown) = start(active_app_config(), &backend).await;

    let res = client().get(format!("{}/fail", base)).send().await.unwrap();
    assert_eq!(res.status(), 500);
    let _ = shutdown.send(());

    let record = backend.single_transaction().unwrap();
    assert_eq!(record.errors, vec!["simulated failure"]);
    assert_eq!(record.response.unwrap().status.map(|s| s.as_u16()), Some(500));
}

#[tokio::test]
async fn test_default_config_serves_without_instrumentation() {
    let backend = InMemoryBackend::new();
    let (base, shutdown) = start(AppConfig::default(), &backend).await;

    let res = client().get(format!("{}/users/1", base)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let _ = shutdown.send(());

    assert!(backend.is_empty());
}
