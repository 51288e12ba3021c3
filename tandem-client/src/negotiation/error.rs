use super::SignalingState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("only the offerer may create an offer")]
    NotOfferer,

    #[error("an offer is already pending for this round")]
    OfferPending,

    #[error("this round is already negotiated; start a new session to offer again")]
    RoundComplete,

    #[error("received an offer while holding an unanswered local offer")]
    Glare,

    #[error("received an offer in state {0}")]
    UnexpectedOffer(SignalingState),

    #[error("received an answer in state {0} with no pending local offer")]
    UnexpectedAnswer(SignalingState),

    #[error("remote description already committed for this round")]
    RemoteAlreadySet,

    #[error("could not re-assert the local offer: {0}")]
    ReassertFailed(String),

    #[error("no negotiation session to apply {0} to")]
    NoSession(&'static str),

    #[error("{op} failed: {message}")]
    Peer { op: &'static str, message: String },

    #[error("session is {0}")]
    Terminated(SignalingState),

    #[error("relay reported: {0}")]
    Relay(String),
}

impl NegotiationError {
    /// Inbound messages that do not fit the current state. Counted toward the
    /// consecutive-violation limit.
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            NegotiationError::Glare
                | NegotiationError::UnexpectedOffer(_)
                | NegotiationError::UnexpectedAnswer(_)
                | NegotiationError::RemoteAlreadySet
                | NegotiationError::ReassertFailed(_)
                | NegotiationError::NoSession(_)
        )
    }

    pub(crate) fn peer(op: &'static str, err: anyhow::Error) -> Self {
        NegotiationError::Peer {
            op,
            message: format!("{err:#}"),
        }
    }
}
