use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::connection::PeerConnectionFactory;
use super::link::PeerLink;
use super::types::{ConnectionState, LinkEvent, LinkEventSender, MeshError, MeshStatus};
use crate::config::MeshConfig;
use crate::signaling::{ClientMessage, Handshake, PeerId, RoomId, ServerMessage};

type Link<F> = PeerLink<<F as PeerConnectionFactory>::Connection>;

/// Drives one PeerLink per remote participant from the relay's membership
/// events.
///
/// Whoever is already in the room offers to each newcomer; a newcomer only
/// answers. The roster is the key set of `links`, so a peer is listed
/// exactly while it has a link.
pub struct PeerMeshCoordinator<F: PeerConnectionFactory> {
    factory: F,
    config: MeshConfig,
    outbound: mpsc::UnboundedSender<ClientMessage>,
    events: LinkEventSender,
    local_id: Option<PeerId>,
    room: Option<RoomId>,
    capacity: Option<usize>,
    links: HashMap<PeerId, Link<F>>,
    status: watch::Sender<MeshStatus>,
}

impl<F: PeerConnectionFactory> PeerMeshCoordinator<F> {
    /// Handshakes to send go out on `outbound`. The returned receiver carries
    /// connection-resource events, which must be fed back through
    /// [`handle_link_event`](Self::handle_link_event).
    pub fn new(
        factory: F,
        config: MeshConfig,
        outbound: mpsc::UnboundedSender<ClientMessage>,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        Self::with_status(factory, config, outbound, watch::Sender::new(MeshStatus::Idle))
    }

    pub fn with_status(
        factory: F,
        config: MeshConfig,
        outbound: mpsc::UnboundedSender<ClientMessage>,
        status: watch::Sender<MeshStatus>,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            factory,
            config,
            outbound,
            events,
            local_id: None,
            room: None,
            capacity: None,
            links: HashMap::new(),
            status,
        };
        (coordinator, events_rx)
    }

    pub fn local_id(&self) -> Option<PeerId> {
        self.local_id
    }

    pub fn room(&self) -> Option<RoomId> {
        self.room
    }

    /// Capacity as announced by the relay.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn peers(&self) -> Vec<PeerId> {
        self.links.keys().copied().collect()
    }

    pub fn link(&self, peer: &PeerId) -> Option<&Link<F>> {
        self.links.get(peer)
    }

    /// Local participant plus every known peer.
    pub fn participant_count(&self) -> usize {
        1 + self.links.len()
    }

    pub fn status(&self) -> MeshStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MeshStatus> {
        self.status.subscribe()
    }

    /// Ask the relay to join `room`.
    pub fn join(&mut self, room: &str) -> Result<(), MeshError> {
        let room_id = RoomId::parse(room).ok_or_else(|| MeshError::InvalidRoom(room.to_string()))?;
        self.send(ClientMessage::Join {
            room_id: room_id.to_string(),
        })?;
        self.set_status(MeshStatus::Joining { room: room_id });
        Ok(())
    }

    /// Leave the room and release every link.
    pub async fn leave(&mut self) {
        let _ = self.send(ClientMessage::Leave);
        self.close_all().await;
        self.set_status(MeshStatus::Left);
    }

    /// The signaling channel is gone; release every link.
    pub async fn disconnected(&mut self) {
        self.close_all().await;
        self.local_id = None;
        self.set_status(MeshStatus::Disconnected);
    }

    pub async fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Welcome { id } => {
                info!("Relay assigned id {}", id);
                self.local_id = Some(id);
            }

            ServerMessage::RoomInfo {
                room_id,
                peers,
                max_participants,
            } => {
                // Joining replaces any previous room.
                self.close_all().await;
                self.room = Some(room_id);
                self.capacity = Some(max_participants);

                for peer in peers {
                    if let Err(e) = self.ensure_link(peer).await {
                        self.report(format!("Failed to set up link to {}: {}", peer, e));
                    }
                }
                info!("Joined room {} with {} peers", room_id, self.links.len());
                self.set_joined_status();
            }

            ServerMessage::RoomFull {
                max_participants,
                size,
            } => {
                self.close_all().await;
                self.capacity = Some(max_participants);
                info!("Room is full ({}/{})", size, max_participants);
                self.set_status(MeshStatus::RoomFull {
                    capacity: max_participants,
                    size,
                });
            }

            ServerMessage::PeerJoined { id } => {
                if Some(id) == self.local_id || self.links.contains_key(&id) {
                    return;
                }
                if self.room.is_none() {
                    debug!("Dropping peer-joined for {} outside a room", id);
                    return;
                }
                match self.offer_to(id).await {
                    Ok(()) => self.set_joined_status(),
                    Err(e) => self.report(format!("Failed to create offer for {}: {}", id, e)),
                }
            }

            ServerMessage::PeerLeft { id } => {
                if let Some(mut link) = self.links.remove(&id) {
                    link.close().await;
                    info!("Peer {} left", id);
                    self.set_joined_status();
                }
            }

            ServerMessage::Offer { from, sdp } => {
                if self.room.is_none() {
                    debug!("Dropping offer from {} outside a room", from);
                    return;
                }
                if let Err(e) = self.answer(from, sdp).await {
                    self.report(format!("Failed to handle offer from {}: {}", from, e));
                }
            }

            ServerMessage::Answer { from, sdp } => {
                let Some(link) = self.links.get_mut(&from) else {
                    debug!("Dropping answer from unknown peer {}", from);
                    return;
                };
                if let Err(e) = link.on_remote_answer(sdp).await {
                    self.report(format!("Failed to handle answer from {}: {}", from, e));
                }
            }

            ServerMessage::Candidate { from, candidate } => {
                let Some(link) = self.links.get_mut(&from) else {
                    debug!("Dropping candidate from unknown peer {}", from);
                    return;
                };
                if let Err(e) = link.on_remote_candidate(candidate).await {
                    debug!("Failed to add candidate from {}: {}", from, e);
                }
            }
        }
    }

    pub async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::LocalCandidate { peer, candidate } => {
                self.send_candidate(peer, candidate);
            }

            LinkEvent::StateChanged { peer, state } => {
                let Some(link) = self.links.get_mut(&peer) else {
                    return;
                };
                if link.on_connection_state(state) {
                    self.set_status(MeshStatus::PeerConnected { peer });
                } else if state == ConnectionState::Failed {
                    self.report(format!("Connection to {} failed", peer));
                }
            }
        }
    }

    async fn offer_to(&mut self, peer: PeerId) -> Result<(), MeshError> {
        let link = self.ensure_link(peer).await?;
        if let Some(offer) = link.create_offer().await? {
            self.send_handshake(peer, offer)?;
        }
        Ok(())
    }

    async fn answer(&mut self, peer: PeerId, sdp: Value) -> Result<(), MeshError> {
        let link = self.ensure_link(peer).await?;
        if let Some(answer) = link.on_remote_offer(sdp).await? {
            self.send_handshake(peer, answer)?;
        }
        Ok(())
    }

    fn send_candidate(&self, peer: PeerId, candidate: Value) {
        match self.links.get(&peer) {
            Some(link) if !link.is_closed() => {
                let _ = self.send_handshake(peer, Handshake::Candidate { candidate });
            }
            _ => debug!("Dropping local candidate for departed peer {}", peer),
        }
    }

    async fn ensure_link(&mut self, peer: PeerId) -> Result<&mut Link<F>, MeshError> {
        match self.links.entry(peer) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let connection = self
                    .factory
                    .create(peer, &self.config.ice_servers, self.events.clone())
                    .await?;
                debug!("Created link to {}", peer);
                Ok(entry.insert(PeerLink::new(peer, connection)))
            }
        }
    }

    async fn close_all(&mut self) {
        for (_, mut link) in self.links.drain() {
            link.close().await;
        }
        self.room = None;
    }

    fn send_handshake(&self, to: PeerId, handshake: Handshake) -> Result<(), MeshError> {
        self.send(handshake.to_peer(to))
    }

    fn send(&self, msg: ClientMessage) -> Result<(), MeshError> {
        self.outbound.send(msg).map_err(|_| MeshError::ChannelClosed)
    }

    fn set_joined_status(&self) {
        if let (Some(room), Some(capacity)) = (self.room, self.capacity) {
            self.set_status(MeshStatus::Joined {
                room,
                participants: self.participant_count(),
                capacity,
            });
        }
    }

    fn report(&self, message: String) {
        warn!("{}", message);
        self.set_status(MeshStatus::Error(message));
    }

    fn set_status(&self, status: MeshStatus) {
        self.status.send_replace(status);
    }
}
