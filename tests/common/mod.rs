//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use led_relay::{HttpServer, LedConfig, LedController, Shutdown};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A relay running on an ephemeral port.
#[allow(dead_code)]
pub struct TestRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub controller: Arc<LedController>,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

#[allow(dead_code)]
impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Start a relay with `config` on 127.0.0.1:0.
pub async fn start_relay(config: LedConfig) -> TestRelay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, shutdown.clone());
    let controller = server.controller();
    let handle = tokio::spawn(async move { server.run(listener).await });

    TestRelay {
        addr,
        shutdown,
        controller,
        handle,
    }
}

/// Connect a WebSocket client and consume its snapshot frame.
///
/// Once the snapshot has arrived the subscriber is registered.
#[allow(dead_code)]
pub async fn subscribe(relay: &TestRelay) -> (WsClient, String) {
    let (mut ws, _) = connect_async(relay.ws_url()).await.unwrap();
    let snapshot = next_text(&mut ws).await;
    (ws, snapshot)
}

/// Next text frame, failing the test after two seconds.
pub async fn next_text(ws: &mut WsClient) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                other => panic!("expected text frame, got {:?}", other),
            }
        }
    })
    .await;
    frame.expect("timed out waiting for a text frame")
}

/// Assert no text frame arrives within `wait`.
#[allow(dead_code)]
pub async fn expect_silence(ws: &mut WsClient, wait: Duration) {
    if let Ok(frame) = tokio::time::timeout(wait, ws.next()).await {
        panic!("expected no frame, got {:?}", frame);
    }
}

/// Poll until the registry holds exactly `expected` subscribers.
#[allow(dead_code)]
pub async fn wait_for_subscribers(controller: &LedController, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while controller.registry().len() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {} subscribers, registry holds {}",
            expected,
            controller.registry().len()
        )
    });
}
