use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Utf8Bytes;

/// Signaling server errors
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("room registry is not running")]
    RegistryClosed,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Longest accepted room id, in bytes.
pub const ROOM_ID_MAX_LEN: usize = 64;
const PEER_ID_PREFIX: &[u8] = b"peer_";
const PEER_ID_LEN: usize = 37;
const HEX_CHARS: &[u8] = b"0123456789abcdef";

/// Room id: trimmed, non-empty, case-sensitive, at most 64 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomId {
    bytes: [u8; ROOM_ID_MAX_LEN],
    len: u8,
}

impl RoomId {
    /// Trim and validate a client-supplied room name.
    pub fn parse(s: &str) -> Option<Self> {
        let src = s.trim().as_bytes();
        if src.is_empty() || src.len() > ROOM_ID_MAX_LEN {
            return None;
        }
        let mut bytes = [0u8; ROOM_ID_MAX_LEN];
        bytes[..src.len()].copy_from_slice(src);
        Some(Self {
            bytes,
            len: src.len() as u8,
        })
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RoomId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RoomId::parse(&s).ok_or_else(|| D::Error::custom("invalid room id"))
    }
}

/// Participant id: "peer_" + 32 hex, 37 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId {
    bytes: [u8; PEER_ID_LEN],
    len: u8,
}

impl PeerId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; PEER_ID_LEN];
        bytes[..PEER_ID_PREFIX.len()].copy_from_slice(PEER_ID_PREFIX);

        let mut rng = rand::rng();
        let value: u128 = rng.random();

        for i in 0..32 {
            let nibble = ((value >> (124 - i * 4)) & 0xF) as usize;
            bytes[PEER_ID_PREFIX.len() + i] = HEX_CHARS[nibble];
        }
        Self {
            bytes,
            len: PEER_ID_LEN as u8,
        }
    }

    /// Accepts any non-empty id that fits; ids longer than 37 bytes cannot
    /// belong to a session and are rejected rather than truncated.
    pub fn parse(s: &str) -> Option<Self> {
        let src = s.as_bytes();
        if src.is_empty() || src.len() > PEER_ID_LEN {
            return None;
        }
        let mut bytes = [0u8; PEER_ID_LEN];
        bytes[..src.len()].copy_from_slice(src);
        Some(Self {
            bytes,
            len: src.len() as u8,
        })
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PeerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PeerId::parse(&s).ok_or_else(|| D::Error::custom("invalid peer id"))
    }
}

/// Wrapper for outbound WebSocket messages using tungstenite's Utf8Bytes.
#[derive(Debug, Clone)]
pub struct OutboundMessage(Utf8Bytes);

impl OutboundMessage {
    /// Create a new outbound message from any string type
    pub fn new(s: impl Into<Utf8Bytes>) -> Self {
        Self(s.into())
    }

    /// Get the inner Utf8Bytes for tungstenite Message::Text
    pub fn into_inner(self) -> Utf8Bytes {
        self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for OutboundMessage {
    fn from(s: String) -> Self {
        Self(Utf8Bytes::from(s))
    }
}

pub type SessionSender = mpsc::UnboundedSender<OutboundMessage>;

#[derive(Debug)]
pub(crate) struct Room {
    /// Outbound queue of every member, keyed by participant id.
    pub members: HashMap<PeerId, SessionSender>,
}

impl Room {
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
        }
    }
}
