//! Integration tests for the presence-agent HTTP server

use presence_agent::config::Config;
use presence_agent::server::run;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;

async fn start_server() -> (SocketAddr, oneshot::Sender<()>) {
    // Random port, localhost only.
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Config::default()
    };
    let (addr, shutdown_tx) = run(config).await.expect("Failed to start server");

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, shutdown_tx)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (addr, shutdown_tx) = start_server().await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_window_snapshot_degrades_without_desktop() {
    let (addr, shutdown_tx) = start_server().await;

    let client = reqwest::Client::new();
    let body: serde_json::Value = client
        .get(format!("http://{}/snapshot", addr))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");

    // No foreground window in a headless test environment: every field
    // degrades to empty/null rather than erroring.
    assert!(body["title"].is_string());
    assert!(body["dwell_secs"].is_null() || body["dwell_secs"].is_number());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_song_snapshot_is_idle_without_players() {
    let (addr, shutdown_tx) = start_server().await;

    let client = reqwest::Client::new();
    let body: serde_json::Value = client
        .get(format!("http://{}/song", addr))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");

    assert_eq!(body["status"], "idle");
    assert!(body["title"].is_null());
    assert!(body["artist"].is_null());
    assert!(body["source"].is_null());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_mobile_ingestion_round_trip() {
    let (addr, shutdown_tx) = start_server().await;
    let client = reqwest::Client::new();

    // Before any push the feed is waiting with no identity.
    let body: serde_json::Value = client
        .get(format!("http://{}/mobile", addr))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(body["status"], "waiting");
    assert_eq!(body["apps"].as_array().map(Vec::len), Some(0));

    // Push an app identity as JSON.
    let ack: serde_json::Value = client
        .post(format!("http://{}/macrodroid", addr))
        .json(&serde_json::json!({"app_name": "微信", "package_name": "com.tencent.mm"}))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(ack["status"], "success");
    assert_eq!(ack["received_data"]["app_name"], "微信");

    let body: serde_json::Value = client
        .get(format!("http://{}/mobile", addr))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(body["status"], "success");
    assert_eq!(body["apps"][0]["name"], "微信");
    assert_eq!(body["apps"][0]["package"], "com.tencent.mm");

    // A malformed push is acknowledged as an error but keeps the identity.
    let ack: serde_json::Value = client
        .post(format!("http://{}/macrodroid", addr))
        .body("")
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(ack["status"], "error");

    let body: serde_json::Value = client
        .get(format!("http://{}/mobile", addr))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(body["apps"][0]["name"], "微信");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_mobile_ingestion_accepts_form_fields() {
    let (addr, shutdown_tx) = start_server().await;
    let client = reqwest::Client::new();

    let ack: serde_json::Value = client
        .post(format!("http://{}/macrodroid", addr))
        .form(&[("name", "Maps"), ("package", "com.google.maps")])
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(ack["status"], "success");

    let body: serde_json::Value = client
        .get(format!("http://{}/mobile", addr))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(body["apps"][0]["name"], "Maps");
    assert_eq!(body["apps"][0]["package"], "com.google.maps");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_simple_ingestion_defaults_to_placeholder() {
    let (addr, shutdown_tx) = start_server().await;
    let client = reqwest::Client::new();

    let ack: serde_json::Value = client
        .get(format!("http://{}/macrodroid/simple?app=Telegram", addr))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(ack["status"], "success");

    let body: serde_json::Value = client
        .get(format!("http://{}/mobile", addr))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(body["apps"][0]["name"], "Telegram");

    // No parameter at all falls back to the fixed placeholder.
    let ack: serde_json::Value = client
        .get(format!("http://{}/macrodroid/simple", addr))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(ack["status"], "success");

    let body: serde_json::Value = client
        .get(format!("http://{}/mobile", addr))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(body["apps"][0]["name"], "未知应用");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_streams_are_server_sent_events() {
    let (addr, shutdown_tx) = start_server().await;
    let client = reqwest::Client::new();

    for path in ["/stream", "/song/stream", "/mobile/stream"] {
        let response = client
            .get(format!("http://{}{}", addr, path))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success(), "{path}");
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("text/event-stream"),
            "{path}"
        );
        // Dropping the response disconnects the subscriber and ends the
        // stream server-side.
    }

    let _ = shutdown_tx.send(());
}
