use async_trait::async_trait;
use tandem_core::{Envelope, RoomId};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Envelope(Envelope),
    /// A frame that did not decode as an envelope.
    Malformed(String),
    /// The link is gone. `abnormal` is false only for a clean close handshake.
    Closed { abnormal: bool },
}

/// An established relay connection. Dropping `outbound` closes the link.
pub struct RelayLink {
    pub outbound: mpsc::UnboundedSender<Envelope>,
    pub inbound: mpsc::UnboundedReceiver<RelayEvent>,
}

/// Opens a relay connection joined to one room.
#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn connect(&self, relay_url: &str, room: &RoomId) -> anyhow::Result<RelayLink>;
}
