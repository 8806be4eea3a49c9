use tokio::sync::{mpsc, oneshot};
use tracing::info;

use super::messages::Handshake;
use super::registry::{JoinOutcome, RegistryStats, RoomRegistry};
use super::types::{PeerId, SessionSender, SignalingError};

/// Commands sent to the room registry actor
pub(crate) enum RoomCommand {
    Join {
        peer_id: PeerId,
        room_id: String,
        peer_tx: SessionSender,
        reply: oneshot::Sender<JoinOutcome>,
    },
    Leave {
        peer_id: PeerId,
    },
    Relay {
        from: PeerId,
        to: String,
        handshake: Handshake,
    },
    Stats {
        reply: oneshot::Sender<RegistryStats>,
    },
}

/// Owns the registry; every membership change and relay hop runs here, one
/// at a time, so capacity checks never race.
pub(crate) async fn room_registry_actor(mut registry: RoomRegistry, mut rx: mpsc::Receiver<RoomCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            RoomCommand::Join {
                peer_id,
                room_id,
                peer_tx,
                reply,
            } => {
                let outcome = registry.join(peer_id, &room_id, peer_tx);
                let _ = reply.send(outcome);
            }

            RoomCommand::Leave { peer_id } => {
                registry.leave(peer_id);
            }

            RoomCommand::Relay {
                from,
                to,
                handshake,
            } => {
                registry.relay(from, &to, handshake);
            }

            RoomCommand::Stats { reply } => {
                let _ = reply.send(registry.stats());
            }
        }
    }

    let stats = registry.stats();
    info!(
        "Room registry stopped ({} rooms, {} sessions dropped)",
        stats.rooms, stats.sessions
    );
}

/// Handle to communicate with the room registry actor
#[derive(Clone)]
pub struct RoomRegistryHandle {
    pub(crate) tx: mpsc::Sender<RoomCommand>,
}

impl RoomRegistryHandle {
    /// Spawn a registry actor on the current runtime.
    pub fn spawn(registry: RoomRegistry) -> Self {
        let (tx, rx) = mpsc::channel::<RoomCommand>(1024);
        tokio::spawn(room_registry_actor(registry, rx));
        Self { tx }
    }

    /// Join (or switch to) a room. The reply frame is already queued on
    /// `peer_tx` by the time this returns.
    pub async fn join(
        &self,
        peer_id: PeerId,
        room_id: String,
        peer_tx: SessionSender,
    ) -> Result<JoinOutcome, SignalingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(RoomCommand::Join {
                peer_id,
                room_id,
                peer_tx,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SignalingError::RegistryClosed)?;
        reply_rx.await.map_err(|_| SignalingError::RegistryClosed)
    }

    /// Leave the current room, if any
    pub async fn leave(&self, peer_id: PeerId) {
        let _ = self.tx.send(RoomCommand::Leave { peer_id }).await;
    }

    /// Route a handshake to a member of the sender's room. Undeliverable
    /// handshakes are dropped by the actor.
    pub async fn relay(&self, from: PeerId, to: String, handshake: Handshake) {
        let _ = self
            .tx
            .send(RoomCommand::Relay {
                from,
                to,
                handshake,
            })
            .await;
    }

    pub async fn stats(&self) -> Result<RegistryStats, SignalingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(RoomCommand::Stats { reply: reply_tx })
            .await
            .map_err(|_| SignalingError::RegistryClosed)?;
        reply_rx.await.map_err(|_| SignalingError::RegistryClosed)
    }
}
