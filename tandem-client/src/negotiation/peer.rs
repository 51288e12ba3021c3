use crate::client::DriverInput;
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

use super::{Role, SessionId};

/// The media capability a negotiation session drives. Implemented over the
/// native WebRTC stack by [`crate::WebRtcPeer`]; tests substitute fakes.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> anyhow::Result<SessionDescription>;
    async fn create_answer(&self) -> anyhow::Result<SessionDescription>;
    async fn set_local_description(&self, desc: SessionDescription) -> anyhow::Result<()>;
    async fn set_remote_description(&self, desc: SessionDescription) -> anyhow::Result<()>;
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> anyhow::Result<()>;
    async fn close(&self) -> anyhow::Result<()>;
}

/// Creates a fresh peer connection for each negotiation session.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    async fn create(&self, role: Role, events: PeerEventSink)
    -> anyhow::Result<Arc<dyn PeerConnection>>;
}

/// Connectivity state reported by the media stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// A local candidate was gathered and should be sent to the peer.
    LocalCandidate(IceCandidate),
    StateChanged(PeerConnectionState),
    /// A remote media track arrived (`audio` or `video`).
    RemoteTrack(String),
}

/// Where a peer connection reports its events. Each sink is bound to one
/// session; events from a replaced session are discarded by the client.
#[derive(Clone)]
pub struct PeerEventSink {
    session: SessionId,
    tx: mpsc::UnboundedSender<DriverInput>,
}

impl PeerEventSink {
    pub(crate) fn new(session: SessionId, tx: mpsc::UnboundedSender<DriverInput>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Returns `false` once the client has shut down.
    pub fn emit(&self, event: PeerEvent) -> bool {
        self.tx
            .send(DriverInput::Peer {
                session: self.session,
                event,
            })
            .is_ok()
    }
}
