//! WebSocket signaling relay: room membership and directed handshake routing

mod actor;
mod messages;
mod registry;
mod server;
mod types;

pub use actor::RoomRegistryHandle;
pub use messages::{ClientMessage, Handshake, ServerMessage};
pub use registry::{DEFAULT_MAX_PARTICIPANTS, JoinOutcome, RegistryStats, RoomRegistry};
pub use server::SignalingServer;
pub use types::{OutboundMessage, PeerId, ROOM_ID_MAX_LEN, RoomId, SessionSender, SignalingError};
