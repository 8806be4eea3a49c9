//! In-memory peer connection used by the mesh unit tests.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use super::connection::{PeerConnection, PeerConnectionFactory};
use super::types::{LinkEventSender, MeshError};
use crate::signaling::PeerId;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateOffer,
    CreateAnswer,
    SetRemoteDescription(Value),
    AddIceCandidate(Value),
    Close,
}

type Log = Arc<Mutex<Vec<(PeerId, Call)>>>;

#[derive(Clone, Default)]
pub struct FakeFactory {
    log: Log,
    created: Arc<Mutex<Vec<(PeerId, Vec<String>, LinkEventSender)>>>,
    fail: bool,
}

impl FakeFactory {
    /// Factory whose connections fail to create descriptions.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self, remote: &str) -> Vec<Call> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(peer, _)| peer.as_str() == remote)
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn created(&self) -> Vec<PeerId> {
        self.created.lock().unwrap().iter().map(|(peer, _, _)| *peer).collect()
    }

    pub fn ice_servers(&self, remote: &str) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .find(|(peer, _, _)| peer.as_str() == remote)
            .map(|(_, servers, _)| servers.clone())
            .unwrap_or_default()
    }

    /// Event sender the connection for `remote` was created with.
    pub fn events(&self, remote: &str) -> LinkEventSender {
        self.created
            .lock()
            .unwrap()
            .iter()
            .find(|(peer, _, _)| peer.as_str() == remote)
            .map(|(_, _, events)| events.clone())
            .unwrap()
    }
}

impl PeerConnectionFactory for FakeFactory {
    type Connection = FakeConnection;

    async fn create(
        &self,
        remote: PeerId,
        ice_servers: &[String],
        events: LinkEventSender,
    ) -> Result<FakeConnection, MeshError> {
        self.created
            .lock()
            .unwrap()
            .push((remote, ice_servers.to_vec(), events));
        Ok(FakeConnection {
            remote,
            log: self.log.clone(),
            fail: self.fail,
        })
    }
}

pub struct FakeConnection {
    remote: PeerId,
    log: Log,
    fail: bool,
}

impl FakeConnection {
    fn record(&self, call: Call) {
        self.log.lock().unwrap().push((self.remote, call));
    }

    fn check(&self) -> Result<(), MeshError> {
        if self.fail {
            return Err(MeshError::Connection("description failed".to_string()));
        }
        Ok(())
    }
}

impl PeerConnection for FakeConnection {
    async fn create_offer(&mut self) -> Result<Value, MeshError> {
        self.check()?;
        self.record(Call::CreateOffer);
        Ok(json!({"type": "offer", "sdp": format!("offer-{}", self.remote)}))
    }

    async fn create_answer(&mut self) -> Result<Value, MeshError> {
        self.check()?;
        self.record(Call::CreateAnswer);
        Ok(json!({"type": "answer", "sdp": format!("answer-{}", self.remote)}))
    }

    async fn set_remote_description(&mut self, sdp: Value) -> Result<(), MeshError> {
        self.record(Call::SetRemoteDescription(sdp));
        Ok(())
    }

    async fn add_ice_candidate(&mut self, candidate: Value) -> Result<(), MeshError> {
        self.record(Call::AddIceCandidate(candidate));
        Ok(())
    }

    async fn close(&mut self) {
        self.record(Call::Close);
    }
}
