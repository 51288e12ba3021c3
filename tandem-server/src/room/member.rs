use axum::extract::ws::Message;
use tandem_core::ConnectionId;
use tokio::sync::mpsc;

/// Outbound half of one relay connection as seen by the registry.
///
/// Sending never blocks: frames are queued on the connection's writer task,
/// which owns the socket sink.
#[derive(Debug, Clone)]
pub struct MemberConnection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Message>,
}

impl MemberConnection {
    pub fn new(id: ConnectionId, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a frame for this member. Fails only if the writer task is gone.
    pub fn send(&self, msg: Message) -> Result<(), mpsc::error::SendError<Message>> {
        self.tx.send(msg)
    }
}
