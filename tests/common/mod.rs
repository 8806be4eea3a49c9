#![allow(dead_code)]

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use huddle::config::RelayConfig;
use huddle::signaling::{RoomRegistryHandle, SignalingServer};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const SILENCE: Duration = Duration::from_millis(200);

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start a relay on an ephemeral port. Returns its url and registry handle.
pub async fn start_relay(max_participants: usize) -> (String, RoomRegistryHandle) {
    start_relay_with(RelayConfig {
        max_participants,
        ..RelayConfig::default()
    })
    .await
}

/// Start a relay with custom settings; the bind address is always ephemeral.
pub async fn start_relay_with(config: RelayConfig) -> (String, RoomRegistryHandle) {
    let config = RelayConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        ..config
    };
    let server = SignalingServer::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let registry = server.registry();
    tokio::spawn(server.run());
    (format!("ws://{}", addr), registry)
}

/// Raw WebSocket participant.
pub struct TestClient {
    pub id: String,
    tx: SplitSink<Ws, Message>,
    rx: SplitStream<Ws>,
}

impl TestClient {
    /// Connect and consume the welcome frame.
    pub async fn connect(url: &str) -> Self {
        let (ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
        let (tx, rx) = ws.split();
        let mut client = Self {
            id: String::new(),
            tx,
            rx,
        };
        let welcome = client.recv().await;
        assert_eq!(welcome["type"], "welcome");
        client.id = welcome["id"].as_str().unwrap().to_string();
        client
    }

    pub async fn send(&mut self, msg: Value) {
        self.send_raw(&msg.to_string()).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.tx.send(Message::Text(text.to_string().into())).await.unwrap();
    }

    pub async fn join(&mut self, room: &str) -> Value {
        self.send(serde_json::json!({"type": "join", "roomId": room})).await;
        self.recv().await
    }

    /// Next text frame as JSON.
    pub async fn recv(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.rx.next())
                .await
                .expect("timed out waiting for frame")
                .expect("stream ended")
                .unwrap();
            if let Message::Text(text) = frame {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    /// Assert nothing arrives for a short while.
    pub async fn expect_silence(&mut self) {
        loop {
            match tokio::time::timeout(SILENCE, self.rx.next()).await {
                Err(_) => return,
                Ok(Some(Ok(Message::Text(text)))) => panic!("unexpected frame: {}", text),
                Ok(Some(Ok(_))) => continue,
                Ok(other) => panic!("unexpected stream state: {:?}", other),
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.tx.close().await;
    }
}
