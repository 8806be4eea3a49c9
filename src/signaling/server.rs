use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Bytes, Message};
use tracing::{debug, error, info, warn};

use super::actor::RoomRegistryHandle;
use super::messages::{ClientMessage, ServerMessage};
use super::registry::RoomRegistry;
use super::types::{OutboundMessage, PeerId, SessionSender, SignalingError};
use crate::config::RelayConfig;

/// Shortest keepalive period accepted; `tokio::time::interval` rejects zero.
const MIN_KEEPALIVE: Duration = Duration::from_secs(1);

/// Keepalive timing for one connection.
#[derive(Debug, Clone, Copy)]
struct Keepalive {
    ping_interval: Duration,
    pong_timeout: Duration,
}

impl From<&RelayConfig> for Keepalive {
    fn from(config: &RelayConfig) -> Self {
        Self {
            ping_interval: config.ping_interval.max(MIN_KEEPALIVE),
            pong_timeout: config.pong_timeout.max(MIN_KEEPALIVE),
        }
    }
}

pub struct SignalingServer {
    listener: TcpListener,
    handle: RoomRegistryHandle,
    keepalive: Keepalive,
}

impl SignalingServer {
    /// Bind the listener and start the room registry.
    pub async fn bind(config: &RelayConfig) -> Result<Self, SignalingError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        let handle = RoomRegistryHandle::spawn(RoomRegistry::new(config.max_participants));

        info!(
            "Signaling server listening on {} (max {} per room)",
            listener.local_addr()?,
            config.max_participants
        );

        Ok(Self {
            listener,
            handle,
            keepalive: Keepalive::from(config),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> RoomRegistryHandle {
        self.handle.clone()
    }

    pub async fn run(self) -> Result<(), SignalingError> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            let handle = self.handle.clone();
            let keepalive = self.keepalive;

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, handle, keepalive).await {
                    error!("Connection error from {}: {}", addr, e);
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    handle: RoomRegistryHandle,
    keepalive: Keepalive,
) -> Result<(), SignalingError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let peer_id = PeerId::generate();
    info!("WebSocket connection from {} as {}", addr, peer_id);

    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ctrl_tx, mut ctrl_rx) = mpsc::unbounded_channel::<Message>();

    let welcome = serde_json::to_string(&ServerMessage::Welcome { id: peer_id })?;
    let _ = tx.send(OutboundMessage::from(welcome));

    let mut ping_interval = tokio::time::interval(keepalive.ping_interval);
    ping_interval.reset();
    let mut waiting_for_pong = false;
    let mut pong_deadline: Option<tokio::time::Instant> = None;

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    let ws_msg = Message::Text(msg.into_inner());
                    if ws_tx.send(ws_msg).await.is_err() {
                        break;
                    }
                }
                Some(ctrl_msg) = ctrl_rx.recv() => {
                    if ws_tx.send(ctrl_msg).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    });

    loop {
        let pong_timeout = async {
            match pong_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = ping_interval.tick() => {
                if waiting_for_pong {
                    warn!("No Pong received, disconnecting {}", peer_id);
                    break;
                }
                if ctrl_tx.send(Message::Ping(Bytes::new())).is_err() {
                    break;
                }
                waiting_for_pong = true;
                pong_deadline = Some(tokio::time::Instant::now() + keepalive.pong_timeout);
                debug!("Ping sent to {}", peer_id);
            }

            _ = pong_timeout => {
                warn!("Pong timeout, disconnecting {}", peer_id);
                break;
            }

            msg = ws_rx.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", peer_id, e);
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => {
                        if let Err(e) = handle_text_message(&text, &tx, &handle, peer_id).await {
                            warn!("Message handling error for {}: {}", peer_id, e);
                            break;
                        }
                    }
                    Message::Pong(_) => {
                        waiting_for_pong = false;
                        pong_deadline = None;
                        debug!("Pong received from {}", peer_id);
                    }
                    Message::Close(_) => {
                        info!("Close received from {}", peer_id);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    handle.leave(peer_id).await;

    send_task.abort();
    info!("WebSocket disconnected: {}", peer_id);

    Ok(())
}

/// Dispatch one client frame. Malformed frames are dropped without a reply;
/// only a dead registry is reported back to the connection loop.
async fn handle_text_message(
    text: &str,
    tx: &SessionSender,
    handle: &RoomRegistryHandle,
    peer_id: PeerId,
) -> Result<(), SignalingError> {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            debug!("Dropping malformed frame from {}: {}", peer_id, e);
            return Ok(());
        }
    };

    match client_msg {
        ClientMessage::Join { room_id } => {
            handle.join(peer_id, room_id, tx.clone()).await?;
        }

        ClientMessage::Leave => {
            handle.leave(peer_id).await;
        }

        handshake => {
            if let Some((to, handshake)) = handshake.into_handshake() {
                handle.relay(peer_id, to, handshake).await;
            }
        }
    }

    Ok(())
}
