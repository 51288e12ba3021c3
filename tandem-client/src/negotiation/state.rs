use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the offer/answer exchange this client plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sends the first description (the phone, which owns the camera).
    Offerer,
    /// Waits for an offer and answers it (the desktop).
    Answerer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Offerer => f.write_str("offerer"),
            Role::Answerer => f.write_str("answerer"),
        }
    }
}

/// Signaling state of one negotiation session.
///
/// Offerer: `Idle -> HaveLocalOffer -> StableConnected`.
/// Answerer: `Idle -> HaveRemoteOffer -> StableConnected`.
/// `Failed` and `Closed` are terminal and reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalingState {
    Idle,
    HaveLocalOffer,
    HaveRemoteOffer,
    StableConnected,
    Failed,
    Closed,
}

impl SignalingState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SignalingState::Failed | SignalingState::Closed)
    }
}

impl fmt::Display for SignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalingState::Idle => "idle",
            SignalingState::HaveLocalOffer => "have-local-offer",
            SignalingState::HaveRemoteOffer => "have-remote-offer",
            SignalingState::StableConnected => "stable-connected",
            SignalingState::Failed => "failed",
            SignalingState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Identifies one session instance within a client. A replaced session gets a
/// new id, which lets late events from its peer connection be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
