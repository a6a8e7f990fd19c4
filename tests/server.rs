//! End-to-end server run over a real TCP listener.

use std::time::Duration;

use api_server::config::AppConfig;
use api_server::http::middleware::{RequestLogConfig, RequestLogHandle};
use api_server::lifecycle::Shutdown;
use api_server::observability::Severity;
use api_server::ApiServer;

mod common;
use common::{capture_logger, records};

#[tokio::test]
async fn test_server_logs_requests_and_stops_on_shutdown() {
    let (logger, buffer) = capture_logger(Severity::Debug);
    let request_log = RequestLogHandle::new(RequestLogConfig::new(logger.clone()));
    let server = ApiServer::new(AppConfig::default(), logger, request_log);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let task = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let index = client
        .get(format!("{}/", base))
        .header("user-agent", "e2e")
        .send()
        .await
        .unwrap();
    assert_eq!(index.status(), 200);
    let request_id = index
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body: serde_json::Value = index.json().await.unwrap();
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"]["status"], "ok");

    let health = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(health.status(), 200);
    health.bytes().await.unwrap();

    let missing = client.get(format!("{}/nope", base)).send().await.unwrap();
    assert_eq!(missing.status(), 404);
    let body: serde_json::Value = missing.json().await.unwrap();
    assert_eq!(body["error"], "no route for /nope");

    let ws = client.post(format!("{}/ws", base)).send().await.unwrap();
    assert_eq!(ws.text().await.unwrap(), "WebSocket endpoint placeholder");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let records = records(&buffer);
    let messages: Vec<&str> = records
        .iter()
        .map(|r| r["message"].as_str().unwrap())
        .collect();

    assert!(messages.contains(&"Server starting"));
    assert!(messages.contains(&"Index route accessed"));
    assert!(messages.contains(&"GET / 200"));
    assert!(messages.contains(&"GET /nope 404"));
    assert!(messages.contains(&"POST /ws 200"));
    assert!(!messages.iter().any(|m| m.starts_with("GET /health")));
    assert_eq!(messages.last(), Some(&"Server stopped gracefully"));

    let index_entry = records
        .iter()
        .find(|r| r["message"] == "GET / 200")
        .unwrap();
    assert_eq!(index_entry["fields"]["request_id"], request_id.as_str());
    assert_eq!(index_entry["fields"]["user_agent"], "e2e");
    assert!(index_entry["fields"]["remote_addr"]
        .as_str()
        .unwrap()
        .starts_with("127.0.0.1:"));
}
