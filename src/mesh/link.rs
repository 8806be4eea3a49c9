use serde_json::Value;
use tracing::{debug, info, warn};

use super::connection::PeerConnection;
use super::types::{ConnectionState, LinkState, MeshError, Role};
use crate::signaling::{Handshake, PeerId};

/// Offer/answer/candidate sequencing with exactly one remote participant.
///
/// Remote candidates that arrive before the remote description are held in
/// arrival order and applied right after it is installed.
pub struct PeerLink<C> {
    remote: PeerId,
    connection: C,
    role: Option<Role>,
    state: LinkState,
    remote_description_set: bool,
    pending_candidates: Vec<Value>,
}

impl<C: PeerConnection> PeerLink<C> {
    pub fn new(remote: PeerId, connection: C) -> Self {
        Self {
            remote,
            connection,
            role: None,
            state: LinkState::Idle,
            remote_description_set: false,
            pending_candidates: Vec::new(),
        }
    }

    pub fn remote(&self) -> PeerId {
        self.remote
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state == LinkState::Closed
    }

    /// Idle -> OfferSent. Returns the offer to send, or `None` when the link
    /// is not idle.
    pub async fn create_offer(&mut self) -> Result<Option<Handshake>, MeshError> {
        if self.state != LinkState::Idle {
            debug!("Not offering to {} in state {:?}", self.remote, self.state);
            return Ok(None);
        }

        self.role = Some(Role::Offerer);
        let sdp = self.connection.create_offer().await?;
        self.state = LinkState::OfferSent;
        Ok(Some(Handshake::Offer { sdp }))
    }

    /// Idle -> AnswerSent. Returns the answer to send back to the offerer.
    ///
    /// A failure after the remote description went in leaves the resource
    /// half negotiated, so the link is closed and ignores later offers.
    pub async fn on_remote_offer(&mut self, sdp: Value) -> Result<Option<Handshake>, MeshError> {
        if self.state != LinkState::Idle {
            debug!("Ignoring offer from {} in state {:?}", self.remote, self.state);
            return Ok(None);
        }

        self.role = Some(Role::Answerer);
        self.install_remote_description(sdp).await?;
        let answer = match self.connection.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                self.close().await;
                return Err(e);
            }
        };
        self.state = LinkState::AnswerSent;
        Ok(Some(Handshake::Answer { sdp: answer }))
    }

    /// OfferSent -> Negotiating.
    pub async fn on_remote_answer(&mut self, sdp: Value) -> Result<(), MeshError> {
        if self.state != LinkState::OfferSent {
            debug!("Ignoring answer from {} in state {:?}", self.remote, self.state);
            return Ok(());
        }

        self.install_remote_description(sdp).await?;
        self.state = LinkState::Negotiating;
        Ok(())
    }

    pub async fn on_remote_candidate(&mut self, candidate: Value) -> Result<(), MeshError> {
        if self.is_closed() {
            return Ok(());
        }
        if !self.remote_description_set {
            self.pending_candidates.push(candidate);
            debug!(
                "Buffered candidate from {} ({} pending)",
                self.remote,
                self.pending_candidates.len()
            );
            return Ok(());
        }
        self.connection.add_ice_candidate(candidate).await
    }

    /// Track the resource's connection state. Returns true when the link has
    /// just become established.
    pub fn on_connection_state(&mut self, state: ConnectionState) -> bool {
        match (self.state, state) {
            (LinkState::AnswerSent, ConnectionState::Connecting) => {
                self.state = LinkState::Negotiating;
                false
            }
            (LinkState::AnswerSent | LinkState::Negotiating, ConnectionState::Connected) => {
                self.state = LinkState::Established;
                info!("Link to {} established", self.remote);
                true
            }
            (LinkState::Closed, _) => false,
            (_, ConnectionState::Failed | ConnectionState::Disconnected) => {
                warn!("Link to {} reported {:?} in state {:?}", self.remote, state, self.state);
                false
            }
            _ => false,
        }
    }

    /// Release the resource. Safe in any state, and more than once.
    pub async fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.connection.close().await;
        self.state = LinkState::Closed;
        self.pending_candidates.clear();
        debug!("Link to {} closed", self.remote);
    }

    async fn install_remote_description(&mut self, sdp: Value) -> Result<(), MeshError> {
        self.connection.set_remote_description(sdp).await?;
        self.remote_description_set = true;

        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = self.connection.add_ice_candidate(candidate).await {
                warn!("Failed to apply buffered candidate from {}: {}", self.remote, e);
            }
        }
        Ok(())
    }
}
