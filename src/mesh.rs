//! Client-side mesh negotiation: one PeerLink per remote participant

mod client;
mod connection;
mod coordinator;
#[cfg(test)]
mod fake;
mod link;
mod types;

pub use client::MeshClient;
pub use connection::{PeerConnection, PeerConnectionFactory};
pub use coordinator::PeerMeshCoordinator;
pub use link::PeerLink;
pub use types::{ConnectionState, LinkEvent, LinkEventSender, LinkState, MeshError, MeshStatus, Role};
