use std::collections::HashMap;

use tracing::{debug, info};

use super::messages::{Handshake, ServerMessage};
use super::types::{OutboundMessage, PeerId, Room, RoomId, SessionSender};

/// Default relay-enforced room capacity.
pub const DEFAULT_MAX_PARTICIPANTS: usize = 6;

/// Result of a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Joined; carries the ids of the other members at join time.
    Joined { peers: Vec<PeerId> },
    /// Rejected because the room already holds `capacity` members.
    Full { capacity: usize, size: usize },
    /// Room id was blank or too long; nothing happened.
    Invalid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub rooms: usize,
    pub sessions: usize,
}

/// Owns every live room and which room each session is in.
///
/// Rooms exist only while they have members: created on first join,
/// removed on last leave. Dropping the registry drops every room without
/// notifying anyone.
#[derive(Debug)]
pub struct RoomRegistry {
    capacity: usize,
    rooms: HashMap<RoomId, Room>,
    session_rooms: HashMap<PeerId, RoomId>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARTICIPANTS)
    }
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            rooms: HashMap::new(),
            session_rooms: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Move `peer_id` into `room_id`, leaving any current room first.
    ///
    /// The joiner's `room-info` (or `room-full`) is queued on `peer_tx`
    /// before `peer-joined` goes to anyone else, so every handshake an
    /// existing member sends in response lands after the joiner's roster.
    pub fn join(&mut self, peer_id: PeerId, room_id: &str, peer_tx: SessionSender) -> JoinOutcome {
        let Some(room_id) = RoomId::parse(room_id) else {
            debug!("Peer {} sent an invalid room id", peer_id);
            return JoinOutcome::Invalid;
        };

        self.leave(peer_id);

        let size = self.rooms.get(&room_id).map_or(0, |room| room.members.len());
        if size >= self.capacity {
            info!("Peer {} rejected from full room {} ({}/{})", peer_id, room_id, size, self.capacity);
            send(
                &peer_tx,
                &ServerMessage::RoomFull {
                    max_participants: self.capacity,
                    size,
                },
            );
            return JoinOutcome::Full {
                capacity: self.capacity,
                size,
            };
        }

        let room = self.rooms.entry(room_id).or_insert_with(Room::new);
        let peers: Vec<PeerId> = room.members.keys().copied().collect();

        send(
            &peer_tx,
            &ServerMessage::RoomInfo {
                room_id,
                peers: peers.clone(),
                max_participants: self.capacity,
            },
        );
        broadcast(room, &ServerMessage::PeerJoined { id: peer_id });

        room.members.insert(peer_id, peer_tx);
        self.session_rooms.insert(peer_id, room_id);

        info!("Peer {} joined room {} ({}/{})", peer_id, room_id, peers.len() + 1, self.capacity);
        JoinOutcome::Joined { peers }
    }

    /// Remove `peer_id` from its room. Returns the room it left, or `None`
    /// when it was not in one.
    pub fn leave(&mut self, peer_id: PeerId) -> Option<RoomId> {
        let room_id = self.session_rooms.remove(&peer_id)?;
        let room = self.rooms.get_mut(&room_id)?;

        room.members.remove(&peer_id);
        broadcast(room, &ServerMessage::PeerLeft { id: peer_id });
        info!("Peer {} left room {}", peer_id, room_id);

        if room.members.is_empty() {
            self.rooms.remove(&room_id);
            info!("Room {} removed (empty)", room_id);
        }
        Some(room_id)
    }

    /// Forward a handshake from `from` to the member named `to` of the
    /// sender's room. Returns whether it was delivered to a queue.
    pub fn relay(&self, from: PeerId, to: &str, handshake: Handshake) -> bool {
        let Some(room_id) = self.session_rooms.get(&from) else {
            debug!("Dropping {} from {}: not in a room", handshake.kind(), from);
            return false;
        };
        let Some(target) = PeerId::parse(to) else {
            debug!("Dropping {} from {}: bad target", handshake.kind(), from);
            return false;
        };
        let Some(target_tx) = self
            .rooms
            .get(room_id)
            .and_then(|room| room.members.get(&target))
        else {
            debug!("Dropping {} from {}: {} not in room {}", handshake.kind(), from, target, room_id);
            return false;
        };

        debug!("Relaying {} {} -> {}", handshake.kind(), from, target);
        send(target_tx, &handshake.from_sender(from))
    }

    pub fn room_of(&self, peer_id: PeerId) -> Option<RoomId> {
        self.session_rooms.get(&peer_id).copied()
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<PeerId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            rooms: self.rooms.len(),
            sessions: self.session_rooms.len(),
        }
    }
}

fn encode(msg: &ServerMessage) -> Option<OutboundMessage> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(OutboundMessage::from(json)),
        Err(e) => {
            debug!("Failed to encode {:?}: {}", msg, e);
            None
        }
    }
}

/// Queue `msg` for one session. A closed queue is not an error.
fn send(tx: &SessionSender, msg: &ServerMessage) -> bool {
    match encode(msg) {
        Some(out) => tx.send(out).is_ok(),
        None => false,
    }
}

/// Queue `msg` for every member; encoded once, cloned per member.
fn broadcast(room: &Room, msg: &ServerMessage) {
    let Some(out) = encode(msg) else {
        return;
    };
    for tx in room.members.values() {
        let _ = tx.send(out.clone());
    }
}
