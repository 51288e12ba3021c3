use tandem_core::RoomId;

use crate::controller::RetryPolicy;
use crate::negotiation::Role;

pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:8081/ws";

pub const DEFAULT_STUN_SERVERS: [&str; 2] = [
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
];

/// Configuration for a [`super::PeerClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay WebSocket endpoint; the room is appended as `?room=`.
    pub relay_url: String,
    pub room: RoomId,
    pub role: Role,
    pub retry: RetryPolicy,
    /// STUN/TURN urls handed to the media stack.
    pub ice_servers: Vec<String>,
}

impl ClientConfig {
    pub fn new(relay_url: impl Into<String>, room: RoomId, role: Role) -> Self {
        Self {
            relay_url: relay_url.into(),
            room,
            role,
            retry: RetryPolicy::default(),
            ice_servers: DEFAULT_STUN_SERVERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_URL, RoomId::default(), Role::Answerer)
    }
}
