//! Relay and client configuration

use std::time::Duration;

use clap::Parser;

use crate::signaling::DEFAULT_MAX_PARTICIPANTS;

pub const DEFAULT_SIGNALING_PORT: u16 = 9001;
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Public STUN servers handed to every peer connection by default.
pub const DEFAULT_ICE_SERVERS: &[&str] = &[
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
    "stun:stun2.l.google.com:19302",
];

/// Command line / environment options for the relay binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "huddle", version, about = "Room signaling relay for WebRTC mesh calls")]
pub struct RelayArgs {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "BIND_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_SIGNALING_PORT, env = "PORT")]
    pub port: u16,

    /// Maximum members per room
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_PARTICIPANTS as u16,
        env = "MAX_PARTICIPANTS",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub max_participants: u16,

    /// Seconds between keepalive pings
    #[arg(long, default_value_t = DEFAULT_PING_INTERVAL.as_secs(), env = "PING_INTERVAL_SECS")]
    pub ping_interval_secs: u64,

    /// Seconds to wait for a pong before dropping the connection
    #[arg(long, default_value_t = DEFAULT_PONG_TIMEOUT.as_secs(), env = "PONG_TIMEOUT_SECS")]
    pub pong_timeout_secs: u64,
}

impl From<RelayArgs> for RelayConfig {
    fn from(args: RelayArgs) -> Self {
        Self {
            bind_addr: format!("{}:{}", args.host, args.port),
            max_participants: usize::from(args.max_participants),
            ping_interval: Duration::from_secs(args.ping_interval_secs.max(1)),
            pong_timeout: Duration::from_secs(args.pong_timeout_secs.max(1)),
        }
    }
}

/// Settings the relay library runs with.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: String,
    pub max_participants: usize,
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_SIGNALING_PORT),
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            ping_interval: DEFAULT_PING_INTERVAL,
            pong_timeout: DEFAULT_PONG_TIMEOUT,
        }
    }
}

/// Client-side settings for the mesh.
#[derive(Debug, Clone)]
pub struct MeshConfig {
    /// STUN/TURN urls passed to each new peer connection
    pub ice_servers: Vec<String>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            ice_servers: DEFAULT_ICE_SERVERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
