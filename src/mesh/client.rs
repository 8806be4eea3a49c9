use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::connection::PeerConnectionFactory;
use super::coordinator::PeerMeshCoordinator;
use super::types::{MeshError, MeshStatus};
use crate::config::MeshConfig;
use crate::signaling::{ClientMessage, ServerMessage};

/// Joins one room on a relay and keeps the local mesh in step with it until
/// the session ends.
pub struct MeshClient {
    url: String,
    config: MeshConfig,
    status: watch::Sender<MeshStatus>,
}

impl MeshClient {
    pub fn new(url: impl Into<String>, config: MeshConfig) -> Self {
        Self {
            url: url.into(),
            config,
            status: watch::Sender::new(MeshStatus::Idle),
        }
    }

    /// Watch the status the session reports.
    pub fn subscribe(&self) -> watch::Receiver<MeshStatus> {
        self.status.subscribe()
    }

    /// Connect, join `room` and run until the relay disconnects, the room
    /// turns out to be full, or `leave` completes. Every link is closed
    /// before this returns. Returns the final status.
    pub async fn join<F>(
        self,
        room: &str,
        factory: F,
        leave: impl Future<Output = ()>,
    ) -> Result<MeshStatus, MeshError>
    where
        F: PeerConnectionFactory,
    {
        let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        info!("Connected to relay {}", self.url);

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (mut coordinator, mut events_rx) =
            PeerMeshCoordinator::with_status(factory, self.config, out_tx, self.status);
        coordinator.join(room)?;

        tokio::pin!(leave);

        loop {
            tokio::select! {
                _ = &mut leave => {
                    coordinator.leave().await;
                    while let Ok(msg) = out_rx.try_recv() {
                        let _ = ws_tx.send(Message::Text(serde_json::to_string(&msg)?.into())).await;
                    }
                    let _ = ws_tx.close().await;
                    break;
                }

                Some(msg) = out_rx.recv() => {
                    let text = serde_json::to_string(&msg)?;
                    if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                        warn!("Failed to send to relay: {}", e);
                        coordinator.disconnected().await;
                        break;
                    }
                }

                Some(event) = events_rx.recv() => {
                    coordinator.handle_link_event(event).await;
                }

                frame = ws_rx.next() => {
                    let text = match frame {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | None => {
                            coordinator.disconnected().await;
                            break;
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            warn!("Relay connection error: {}", e);
                            coordinator.disconnected().await;
                            break;
                        }
                    };

                    let msg: ServerMessage = match serde_json::from_str(&text) {
                        Ok(m) => m,
                        Err(e) => {
                            debug!("Dropping malformed relay frame: {}", e);
                            continue;
                        }
                    };

                    let full = matches!(msg, ServerMessage::RoomFull { .. });
                    coordinator.handle_server_message(msg).await;
                    if full {
                        let _ = ws_tx.close().await;
                        break;
                    }
                }
            }
        }

        Ok(coordinator.status())
    }
}
