use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::signaling::{PeerId, RoomId};

/// Client-side mesh errors
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("peer connection error: {0}")]
    Connection(String),

    #[error("invalid room id: {0:?}")]
    InvalidRoom(String),

    #[error("signaling channel closed")]
    ChannelClosed,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Which side of the offer/answer exchange a link plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

/// Negotiation progress of one PeerLink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    OfferSent,
    AnswerSent,
    Negotiating,
    Established,
    Closed,
}

/// Connection state reported by the peer-connection resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Asynchronous output of a peer-connection resource.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// A local ICE candidate was gathered and must reach the remote peer.
    LocalCandidate { peer: PeerId, candidate: Value },
    StateChanged { peer: PeerId, state: ConnectionState },
}

pub type LinkEventSender = mpsc::UnboundedSender<LinkEvent>;

/// User-visible status of the local participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshStatus {
    Idle,
    Joining { room: RoomId },
    Joined {
        room: RoomId,
        participants: usize,
        capacity: usize,
    },
    RoomFull { capacity: usize, size: usize },
    PeerConnected { peer: PeerId },
    Left,
    Disconnected,
    Error(String),
}
