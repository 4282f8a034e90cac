// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the built-in udp, tcp, and http sources on loopback
//! ephemeral ports.

use std::net::SocketAddr;
use std::time::Duration;

use fwdd_config::{load_and_validate_str, InputConfig};
use fwdd_core::{HealthStatus, Identity, ManagerState};
use fwdd_input::{FactoryTable, InputManager};
use fwdd_test_utils::recv_events;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_test::traced_test;

const WAIT: Duration = Duration::from_secs(5);

fn input_config(toml: &str) -> InputConfig {
    load_and_validate_str(toml).unwrap().input
}

async fn started(toml: &str) -> InputManager {
    let mut manager = InputManager::from_config(&input_config(toml), &FactoryTable::builtin()).unwrap();
    let report = manager.start().await.unwrap();
    assert!(report.is_success(), "start failed: {report:?}");
    manager
}

fn addr_of(manager: &InputManager, index: usize) -> SocketAddr {
    manager.sources()[index].local_addr().unwrap()
}

#[tokio::test]
async fn udp_datagram_lines_become_events() {
    let mut manager = started(
        r#"
[[input.plugins]]
type = "udp"
port = 0
tags = ["edge"]
attributes = { site = "ams", role = "default" }
"#,
    )
    .await;
    let mut rx = manager.pipeline().take_receiver().unwrap();
    let addr = addr_of(&manager, 0);

    let client = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let payload = concat!(
        r#"{"key":"cpu","value":0.5,"attributes":{"role":"db"}}"#,
        "\n",
        "not json\n",
        r#"{"key":"mem","value":12.0}"#,
    );
    client.send_to(payload.as_bytes(), addr).await.unwrap();

    let events = recv_events(&mut rx, 2, WAIT).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].key, "cpu");
    assert!(events[0].tags.contains("edge"));
    assert_eq!(events[0].attributes["site"], "ams");
    assert_eq!(events[0].attributes["role"], "db");
    assert_eq!(events[1].key, "mem");
    assert_eq!(events[1].attributes["role"], "default");

    manager.stop().await.unwrap();
}

#[tokio::test]
async fn tcp_connections_stream_line_delimited_events() {
    let mut manager = started(
        r#"
[[input.plugins]]
type = "tcp"
host = "localhost"
port = 0
"#,
    )
    .await;
    let mut rx = manager.pipeline().take_receiver().unwrap();
    let addr = addr_of(&manager, 0);

    let mut first = tokio::net::TcpStream::connect(addr).await.unwrap();
    let mut second = tokio::net::TcpStream::connect(addr).await.unwrap();
    first
        .write_all(b"{\"key\":\"a.1\"}\n\n{\"key\":\"a.2\"}\n")
        .await
        .unwrap();
    second.write_all(b"{\"key\":\"b.1\"}\n").await.unwrap();
    first.flush().await.unwrap();
    second.flush().await.unwrap();

    let events = recv_events(&mut rx, 3, WAIT).await;
    let mut keys: Vec<&str> = events.iter().map(|e| e.key.as_str()).collect();
    // Per-connection order holds; interleaving across connections does not.
    let a_positions: Vec<usize> = ["a.1", "a.2"]
        .iter()
        .map(|k| keys.iter().position(|x| x == k).unwrap())
        .collect();
    assert!(a_positions[0] < a_positions[1]);
    keys.sort();
    assert_eq!(keys, vec!["a.1", "a.2", "b.1"]);

    // Stop completes even with connections still open.
    let report = manager.stop().await.unwrap();
    assert!(report.is_success());
}

#[tokio::test]
async fn http_posts_single_and_batched_events() {
    let mut manager = started(
        r#"
[[input.plugins]]
type = "http"
port = 0
path = "/ingest"
tags = ["web"]
"#,
    )
    .await;
    let mut rx = manager.pipeline().take_receiver().unwrap();
    let base = format!("http://{}", addr_of(&manager, 0));
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/ingest"))
        .json(&serde_json::json!({"key": "single", "value": 1.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);

    let resp = client
        .post(format!("{base}/ingest"))
        .json(&serde_json::json!([{"key": "batch.1"}, {"key": "batch.2", "ttl": 30}]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["accepted"], 2);

    let events = recv_events(&mut rx, 3, WAIT).await;
    let keys: Vec<&str> = events.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["single", "batch.1", "batch.2"]);
    assert!(events.iter().all(|e| e.tags.contains("web")));
    assert_eq!(events[2].ttl, Some(30));

    let resp = client
        .post(format!("{base}/ingest"))
        .body("{\"key\":")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    manager.stop().await.unwrap();
}

#[tokio::test]
#[traced_test]
async fn occupied_port_fails_only_that_source() {
    let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let taken = blocker.local_addr().unwrap().port();
    let toml = format!(
        r#"
[[input.plugins]]
type = "udp"
port = 0

[[input.plugins]]
type = "tcp"
port = {taken}

[[input.plugins]]
type = "http"
port = 0
"#
    );
    let mut manager = InputManager::from_config(&input_config(&toml), &FactoryTable::builtin()).unwrap();

    let report = manager.start().await.unwrap();
    assert_eq!(report.failed(), vec![&Identity::from("1")]);
    assert_eq!(report.succeeded(), vec![&Identity::from("0"), &Identity::from("2")]);
    assert!(logs_contain("input source failed to start"));

    let sources = manager.sources();
    assert_eq!(sources[0].health_check().await, HealthStatus::Healthy);
    assert!(matches!(sources[1].health_check().await, HealthStatus::Unhealthy(_)));
    assert!(sources[1].local_addr().is_none());

    let report = manager.stop().await.unwrap();
    assert_eq!(report.len(), 2);
    assert!(report.is_success());
    assert_eq!(manager.state(), ManagerState::Stopped);
    assert!(sources[0].local_addr().is_none());
    drop(blocker);
}

#[tokio::test]
async fn stopped_tcp_source_refuses_connections() {
    let mut manager = started(
        r#"
[[input.plugins]]
type = "tcp"
port = 0
"#,
    )
    .await;
    let addr = addr_of(&manager, 0);
    manager.stop().await.unwrap();

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn oversized_udp_datagram_is_dropped_whole() {
    let mut manager = started(
        r#"
[[input.plugins]]
type = "udp"
port = 0
max_datagram_size = 16
"#,
    )
    .await;
    let mut rx = manager.pipeline().take_receiver().unwrap();
    let addr = addr_of(&manager, 0);

    let client = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    // 24 bytes: two complete events that together exceed the limit.
    client
        .send_to(b"{\"key\":\"a\"}\n{\"key\":\"b\"}\n", addr)
        .await
        .unwrap();
    client.send_to(br#"{"key":"c"}"#, addr).await.unwrap();

    let events = recv_events(&mut rx, 1, WAIT).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].key, "c");
    assert!(recv_events(&mut rx, 1, Duration::from_millis(200)).await.is_empty());

    manager.stop().await.unwrap();
}

#[tokio::test]
async fn overlong_tcp_line_closes_only_that_connection() {
    let mut manager = started(
        r#"
[[input.plugins]]
type = "tcp"
port = 0
max_line_length = 32
"#,
    )
    .await;
    let mut rx = manager.pipeline().take_receiver().unwrap();
    let addr = addr_of(&manager, 0);

    let mut noisy = tokio::net::TcpStream::connect(addr).await.unwrap();
    let mut quiet = tokio::net::TcpStream::connect(addr).await.unwrap();

    let long_line = format!("{{\"key\":\"{}\"}}\n", "x".repeat(100));
    noisy.write_all(long_line.as_bytes()).await.unwrap();

    // The server closes the offending connection.
    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(WAIT, noisy.read(&mut buf)).await;
    assert!(matches!(read, Ok(Ok(0)) | Ok(Err(_))), "connection stayed open: {read:?}");

    quiet.write_all(b"{\"key\":\"still-here\"}\n").await.unwrap();
    let events = recv_events(&mut rx, 1, WAIT).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].key, "still-here");

    manager.stop().await.unwrap();
}
