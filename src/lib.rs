//! Room signaling relay and mesh negotiation for small WebRTC group calls.

pub mod config;
pub mod mesh;
pub mod signaling;
