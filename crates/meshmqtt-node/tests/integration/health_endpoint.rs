//! Health endpoint over HTTP

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use meshmqtt_node::{health, HealthState};
use meshmqtt_relay::{SessionStatus, StatusSource};

struct Fixed(SessionStatus);

impl StatusSource for Fixed {
    fn status(&self) -> SessionStatus {
        self.0
    }
}

fn source(source: bool, dest: bool) -> Arc<dyn StatusSource> {
    Arc::new(Fixed(SessionStatus {
        source_broker_connected: source,
        dest_broker_connected: dest,
        status: source && dest,
    }))
}

async fn get(port: u16, path: &str) -> (String, Value) {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    let (head, body) = response.split_once("\r\n\r\n").unwrap();
    let status_line = head.lines().next().unwrap().to_string();
    (status_line, serde_json::from_str(body).unwrap())
}

async fn start(state: HealthState) -> (u16, CancellationToken, tokio::task::JoinHandle<std::io::Result<()>>) {
    let listener = health::bind(0).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let cancel = CancellationToken::new();
    let server = tokio::spawn(health::serve(listener, state, cancel.clone()));
    (port, cancel, server)
}

#[tokio::test]
async fn test_healthy_relay_and_fanout() {
    let state = HealthState::new(source(true, true)).with_fanout(source(true, true));
    let (port, cancel, server) = start(state).await;

    let (status_line, body) = get(port, "/").await;
    assert!(status_line.starts_with("HTTP/1.1 200"), "{status_line}");
    assert_eq!(body["status"], true);
    assert_eq!(body["relay"]["dest_broker_connected"], true);
    assert_eq!(body["fanout"]["source_broker_connected"], true);

    cancel.cancel();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unhealthy_returns_503() {
    let (port, cancel, server) = start(HealthState::new(source(true, false))).await;

    let (status_line, body) = get(port, "/health").await;
    assert!(status_line.starts_with("HTTP/1.1 503"), "{status_line}");
    assert_eq!(body["status"], false);
    assert_eq!(body["relay"]["source_broker_connected"], true);
    assert!(body.get("fanout").is_none());

    cancel.cancel();
    server.await.unwrap().unwrap();
}
