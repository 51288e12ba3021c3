use std::net::SocketAddr;

/// Relay server settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    /// Path of the WebSocket upgrade endpoint.
    pub ws_path: String,
    /// Path of the read-only diagnostics listing.
    pub rooms_path: String,
    pub welcome_message: String,
    /// Longer room ids are refused with an `error` envelope.
    pub max_room_id_len: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8081)),
            ws_path: "/ws".to_owned(),
            rooms_path: "/rooms".to_owned(),
            welcome_message: "Connected to tandem relay".to_owned(),
            max_room_id_len: 128,
        }
    }
}
