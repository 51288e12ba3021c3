mod config;
mod driver;

pub use config::*;
pub(crate) use driver::DriverInput;

use std::sync::Arc;
use tandem_core::RoomId;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::controller::{ClientStatus, ReconnectController, TokioScheduler};
use crate::negotiation::{PeerFactory, SessionId, SignalingState};
use crate::transport::RelayConnector;
use driver::{ClientCommand, Driver};

/// What happened, in the order the client processed it.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The relay welcomed us into a room.
    Joined(RoomId),
    RelayLost { abnormal: bool },
    SessionState { session: SessionId, state: SignalingState },
    Status(ClientStatus),
    /// Switch back to the local source.
    Fallback,
    /// Reconnect attempts exhausted.
    GaveUp,
    RemoteTrack(String),
    Error(String),
}

#[derive(Debug, Error)]
#[error("peer client has shut down")]
pub struct ClientClosed;

/// Handle to a running signaling client.
///
/// All relay traffic, peer events, timers and commands are handled by one
/// task in arrival order. Dropping the handle shuts that task down.
pub struct PeerClient {
    input_tx: mpsc::UnboundedSender<DriverInput>,
    status: watch::Receiver<ClientStatus>,
    task: Option<JoinHandle<()>>,
}

impl PeerClient {
    pub fn spawn(
        config: ClientConfig,
        connector: Arc<dyn RelayConnector>,
        factory: Arc<dyn PeerFactory>,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (due_tx, mut due_rx) = mpsc::unbounded_channel::<u32>();

        let forward = input_tx.clone();
        tokio::spawn(async move {
            while let Some(attempt) = due_rx.recv().await {
                if forward.send(DriverInput::ReconnectDue(attempt)).is_err() {
                    break;
                }
            }
        });

        let scheduler = Arc::new(TokioScheduler::new(due_tx));
        let controller = ReconnectController::new(config.retry, scheduler);
        let status = controller.subscribe();

        let driver = Driver::new(
            config,
            connector,
            factory,
            input_tx.clone(),
            event_tx,
            controller,
        );
        let task = tokio::spawn(driver.run(input_rx));

        let client = Self {
            input_tx,
            status,
            task: Some(task),
        };
        (client, event_rx)
    }

    pub fn status(&self) -> ClientStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ClientStatus> {
        self.status.clone()
    }

    /// Tears down the current session and negotiates a new one, regardless
    /// of connection health.
    pub fn switch_source(&self) -> Result<(), ClientClosed> {
        self.input_tx
            .send(DriverInput::Command(ClientCommand::SwitchSource))
            .map_err(|_| ClientClosed)
    }

    /// Closes the session and relay link, then waits for the client task.
    pub async fn close(mut self) {
        let (done_tx, done_rx) = oneshot::channel();
        let command = DriverInput::Command(ClientCommand::Close(Some(done_tx)));
        if self.input_tx.send(command).is_ok() {
            let _ = done_rx.await;
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PeerClient {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self
                .input_tx
                .send(DriverInput::Command(ClientCommand::Close(None)));
        }
    }
}
