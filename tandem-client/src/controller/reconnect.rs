use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::{RetryPolicy, Scheduler};
use crate::negotiation::SignalingState;

/// What the application should be showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    /// Negotiating, nothing remote yet.
    Pending,
    /// The remote stream is live.
    Connected,
    /// Negotiation failed before anything connected, or retries ran out.
    Failed,
    /// Reverted to the local source after losing the remote stream.
    Fallback,
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientStatus::Pending => "pending",
            ClientStatus::Connected => "connected",
            ClientStatus::Failed => "failed",
            ClientStatus::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerAction {
    /// Switch the application back to its local source.
    Fallback,
    /// Retries exhausted; the relay will not be contacted again.
    GiveUp,
    /// Tear down the current session and negotiate a new one.
    Renegotiate,
}

/// Owns the client's status and decides when to fall back, reconnect, or
/// give up. Holds no session reference; it is fed state observations.
pub struct ReconnectController {
    policy: RetryPolicy,
    scheduler: Arc<dyn Scheduler>,
    status: ClientStatus,
    attempts: u32,
    retry_desired: bool,
    status_tx: watch::Sender<ClientStatus>,
}

impl ReconnectController {
    pub fn new(policy: RetryPolicy, scheduler: Arc<dyn Scheduler>) -> Self {
        let (status_tx, _) = watch::channel(ClientStatus::Pending);
        Self {
            policy,
            scheduler,
            status: ClientStatus::Pending,
            attempts: 0,
            retry_desired: true,
            status_tx,
        }
    }

    pub fn status(&self) -> ClientStatus {
        self.status
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientStatus> {
        self.status_tx.subscribe()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn retry_desired(&self) -> bool {
        self.retry_desired
    }

    pub fn on_relay_connected(&mut self) {
        if self.attempts > 0 {
            info!(attempts = self.attempts, "Relay reconnected");
        }
        self.attempts = 0;
    }

    /// The relay link dropped, or a connection attempt failed.
    pub fn on_relay_closed(&mut self, abnormal: bool) -> Vec<ControllerAction> {
        let mut actions = Vec::new();

        if abnormal && self.status == ClientStatus::Connected {
            self.enter_fallback("relay connection lost");
            actions.push(ControllerAction::Fallback);
        }

        if !self.retry_desired {
            return actions;
        }

        let attempt = self.attempts + 1;
        match self.policy.delay_for(attempt) {
            Some(delay) => {
                self.attempts = attempt;
                info!(
                    attempt,
                    max = self.policy.max_attempts,
                    "Reconnecting to relay in {:?}", delay
                );
                self.scheduler.schedule(delay, attempt);
            }
            None => {
                warn!(attempts = self.attempts, "Giving up on relay");
                self.retry_desired = false;
                if self.status != ClientStatus::Fallback {
                    self.set_status(ClientStatus::Failed);
                }
                actions.push(ControllerAction::GiveUp);
            }
        }
        actions
    }

    pub fn on_session_state(&mut self, state: SignalingState) -> Option<ControllerAction> {
        match state {
            SignalingState::StableConnected => {
                self.set_status(ClientStatus::Connected);
                None
            }
            SignalingState::Failed if self.status == ClientStatus::Connected => {
                self.enter_fallback("session failed");
                Some(ControllerAction::Fallback)
            }
            SignalingState::Failed if self.status == ClientStatus::Pending => {
                self.set_status(ClientStatus::Failed);
                None
            }
            _ => None,
        }
    }

    /// A new session began negotiating. Clears a failure; an active fallback
    /// stays until the new session connects.
    pub fn on_session_started(&mut self) {
        if self.status == ClientStatus::Failed {
            self.set_status(ClientStatus::Pending);
        }
    }

    /// User asked to switch source: renegotiate unconditionally.
    pub fn on_manual_switch(&mut self) -> ControllerAction {
        info!("Manual source switch");
        self.set_status(ClientStatus::Pending);
        ControllerAction::Renegotiate
    }

    /// No more reconnects; pending timers become no-ops.
    pub fn stop(&mut self) {
        self.retry_desired = false;
    }

    fn enter_fallback(&mut self, reason: &str) {
        warn!("Falling back to local source: {}", reason);
        self.set_status(ClientStatus::Fallback);
    }

    fn set_status(&mut self, status: ClientStatus) {
        if self.status != status {
            self.status = status;
            self.status_tx.send_replace(status);
        }
    }
}
