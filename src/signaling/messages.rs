use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{PeerId, RoomId};

/// Messages sent from client to relay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Join (or switch to) a room by name
    #[serde(rename = "join")]
    Join {
        #[serde(rename = "roomId", default)]
        room_id: String,
    },

    /// Leave the current room
    #[serde(rename = "leave")]
    Leave,

    #[serde(rename = "offer")]
    Offer {
        #[serde(default)]
        to: String,
        #[serde(default)]
        sdp: Value,
    },

    #[serde(rename = "answer")]
    Answer {
        #[serde(default)]
        to: String,
        #[serde(default)]
        sdp: Value,
    },

    #[serde(rename = "candidate")]
    Candidate {
        #[serde(default)]
        to: String,
        #[serde(default)]
        candidate: Value,
    },
}

impl ClientMessage {
    /// Split a directed handshake into its target and payload. Membership
    /// messages yield `None`.
    pub fn into_handshake(self) -> Option<(String, Handshake)> {
        match self {
            ClientMessage::Offer { to, sdp } => Some((to, Handshake::Offer { sdp })),
            ClientMessage::Answer { to, sdp } => Some((to, Handshake::Answer { sdp })),
            ClientMessage::Candidate { to, candidate } => {
                Some((to, Handshake::Candidate { candidate }))
            }
            ClientMessage::Join { .. } | ClientMessage::Leave => None,
        }
    }
}

/// Opaque negotiation payload routed between two members of a room.
#[derive(Debug, Clone, PartialEq)]
pub enum Handshake {
    Offer { sdp: Value },
    Answer { sdp: Value },
    Candidate { candidate: Value },
}

impl Handshake {
    pub fn kind(&self) -> &'static str {
        match self {
            Handshake::Offer { .. } => "offer",
            Handshake::Answer { .. } => "answer",
            Handshake::Candidate { .. } => "candidate",
        }
    }

    /// Stamp the relay-verified sender onto the payload.
    pub fn from_sender(self, from: PeerId) -> ServerMessage {
        match self {
            Handshake::Offer { sdp } => ServerMessage::Offer { from, sdp },
            Handshake::Answer { sdp } => ServerMessage::Answer { from, sdp },
            Handshake::Candidate { candidate } => ServerMessage::Candidate { from, candidate },
        }
    }

    /// Address the payload to `to` for sending through the relay.
    pub fn to_peer(self, to: PeerId) -> ClientMessage {
        let to = to.to_string();
        match self {
            Handshake::Offer { sdp } => ClientMessage::Offer { to, sdp },
            Handshake::Answer { sdp } => ClientMessage::Answer { to, sdp },
            Handshake::Candidate { candidate } => ClientMessage::Candidate { to, candidate },
        }
    }
}

/// Messages sent from relay to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent once, immediately on connect
    #[serde(rename = "welcome")]
    Welcome { id: PeerId },

    /// Joined a room; `peers` lists every other current member
    #[serde(rename = "room-info")]
    RoomInfo {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        peers: Vec<PeerId>,
        #[serde(rename = "maxParticipants")]
        max_participants: usize,
    },

    /// Join rejected; the channel stays open
    #[serde(rename = "room-full")]
    RoomFull {
        #[serde(rename = "maxParticipants")]
        max_participants: usize,
        size: usize,
    },

    #[serde(rename = "peer-joined")]
    PeerJoined { id: PeerId },

    #[serde(rename = "peer-left")]
    PeerLeft { id: PeerId },

    #[serde(rename = "offer")]
    Offer {
        from: PeerId,
        #[serde(default)]
        sdp: Value,
    },

    #[serde(rename = "answer")]
    Answer {
        from: PeerId,
        #[serde(default)]
        sdp: Value,
    },

    #[serde(rename = "candidate")]
    Candidate {
        from: PeerId,
        #[serde(default)]
        candidate: Value,
    },
}
