use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Arranges for a reconnect attempt to fire after `delay`.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, attempt: u32);
}

/// Sleeps on the tokio timer, then reports the attempt number on a channel.
pub struct TokioScheduler {
    due_tx: mpsc::UnboundedSender<u32>,
}

impl TokioScheduler {
    pub fn new(due_tx: mpsc::UnboundedSender<u32>) -> Self {
        Self { due_tx }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, attempt: u32) {
        let due_tx = self.due_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if due_tx.send(attempt).is_err() {
                debug!(attempt, "Reconnect due after client shut down");
            }
        });
    }
}
