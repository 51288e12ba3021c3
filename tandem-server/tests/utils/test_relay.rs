use anyhow::{Context, Result};
use std::net::SocketAddr;
use tandem_server::{RelayConfig, RelayService};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A relay bound to an ephemeral localhost port.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub service: RelayService,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl TestRelay {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(RelayConfig::default()).await
    }

    pub async fn spawn_with(config: RelayConfig) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind test relay")?;
        let addr = listener.local_addr()?;
        let service = RelayService::new(config);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(tandem_server::serve(
            listener,
            service.clone(),
            async move {
                let _ = shutdown_rx.await;
            },
        ));

        Ok(Self {
            addr,
            service,
            shutdown: Some(shutdown_tx),
            handle,
        })
    }

    /// WebSocket URL for `room`, or without the query parameter when `None`.
    pub fn ws_url(&self, room: Option<&str>) -> String {
        match room {
            Some(room) => format!("ws://{}/ws?room={}", self.addr, room),
            None => format!("ws://{}/ws", self.addr),
        }
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}
