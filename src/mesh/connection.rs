use std::future::Future;

use serde_json::Value;

use super::types::{LinkEventSender, MeshError};
use crate::signaling::PeerId;

/// One direct connection to a remote participant, owned by a PeerLink.
///
/// Session descriptions and candidates are opaque JSON, exactly as they
/// travel through the relay. Local candidates and state changes are
/// reported through the event sender handed to the factory.
pub trait PeerConnection: Send {
    /// Create an offer and install it as the local description.
    fn create_offer(&mut self) -> impl Future<Output = Result<Value, MeshError>> + Send;

    /// Create an answer to the installed remote offer and install it as the
    /// local description.
    fn create_answer(&mut self) -> impl Future<Output = Result<Value, MeshError>> + Send;

    fn set_remote_description(
        &mut self,
        sdp: Value,
    ) -> impl Future<Output = Result<(), MeshError>> + Send;

    fn add_ice_candidate(
        &mut self,
        candidate: Value,
    ) -> impl Future<Output = Result<(), MeshError>> + Send;

    /// Release the underlying resource. Called at most once per link.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Builds the connection resource for a newly known remote participant.
pub trait PeerConnectionFactory: Send + Sync {
    type Connection: PeerConnection;

    fn create(
        &self,
        remote: PeerId,
        ice_servers: &[String],
        events: LinkEventSender,
    ) -> impl Future<Output = Result<Self::Connection, MeshError>> + Send;
}
