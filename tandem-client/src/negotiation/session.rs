use std::collections::HashSet;
use std::sync::Arc;
use tandem_core::{Envelope, IceCandidate, SdpType, SessionDescription};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{
    CandidateBuffer, NegotiationError, PeerConnection, PeerConnectionState, Role, SessionId,
    SignalingState,
};

/// Consecutive protocol violations tolerated before the session is failed.
pub const MAX_CONSECUTIVE_VIOLATIONS: u32 = 3;

/// One offer/answer exchange bound to one peer connection.
///
/// The session performs no I/O of its own beyond calls into the peer
/// connection: envelopes it wants to send are queued and collected with
/// [`NegotiationSession::take_outbound`].
pub struct NegotiationSession {
    id: SessionId,
    role: Role,
    state: SignalingState,
    peer: Arc<dyn PeerConnection>,
    local_description: Option<SessionDescription>,
    local_committed: bool,
    reasserted: bool,
    remote_description: Option<SessionDescription>,
    candidates: CandidateBuffer,
    seen_candidates: HashSet<IceCandidate>,
    violations: u32,
    outbound: Vec<Envelope>,
    state_tx: watch::Sender<SignalingState>,
}

impl NegotiationSession {
    pub fn new(id: SessionId, role: Role, peer: Arc<dyn PeerConnection>) -> Self {
        let (state_tx, _) = watch::channel(SignalingState::Idle);
        Self {
            id,
            role,
            state: SignalingState::Idle,
            peer,
            local_description: None,
            local_committed: false,
            reasserted: false,
            remote_description: None,
            candidates: CandidateBuffer::new(),
            seen_candidates: HashSet::new(),
            violations: 0,
            outbound: Vec::new(),
            state_tx,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SignalingState {
        self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<SignalingState> {
        self.state_tx.subscribe()
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    pub fn buffered_candidates(&self) -> usize {
        self.candidates.len()
    }

    pub fn violations(&self) -> u32 {
        self.violations
    }

    /// `true` while this offerer session has not produced an offer yet.
    pub fn can_offer(&self) -> bool {
        self.role == Role::Offerer
            && self.state == SignalingState::Idle
            && self.local_description.is_none()
    }

    /// Envelopes produced since the last call, in the order they were made.
    pub fn take_outbound(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.outbound)
    }

    /// Creates the local offer and queues it for the relay.
    ///
    /// If the media stack refuses to commit the offer locally, the offer is
    /// still sent and the session stays idle; the matching answer re-asserts
    /// it once before applying.
    pub async fn start_offer(&mut self) -> Result<(), NegotiationError> {
        if self.role != Role::Offerer {
            return Err(NegotiationError::NotOfferer);
        }
        match self.state {
            SignalingState::Idle if self.local_description.is_none() => {}
            SignalingState::Idle | SignalingState::HaveLocalOffer => {
                return Err(NegotiationError::OfferPending);
            }
            SignalingState::HaveRemoteOffer | SignalingState::StableConnected => {
                return Err(NegotiationError::RoundComplete);
            }
            state => return Err(NegotiationError::Terminated(state)),
        }

        let created = self.peer.create_offer().await;
        let offer = self.check("create offer", created)?;
        self.local_description = Some(offer.clone());

        match self.peer.set_local_description(offer.clone()).await {
            Ok(()) => {
                self.local_committed = true;
                self.transition(SignalingState::HaveLocalOffer);
            }
            Err(e) => warn!(session = %self.id, "Local offer not committed: {:#}", e),
        }

        self.outbound.push(offer.into());
        Ok(())
    }

    /// Applies one inbound envelope. Violations are counted and any envelope
    /// that applies cleanly resets the count; the third in a row fails the
    /// session.
    pub async fn handle_envelope(&mut self, envelope: Envelope) -> Result<(), NegotiationError> {
        let result = match envelope {
            Envelope::Welcome { room_id, .. } => {
                debug!(session = %self.id, room = %room_id, "Welcome received");
                return Ok(());
            }
            Envelope::Error { message } => return Err(NegotiationError::Relay(message)),
            _ if self.state.is_terminal() => {
                debug!(session = %self.id, kind = envelope.kind(), "Dropping envelope for {} session", self.state);
                return Err(NegotiationError::Terminated(self.state));
            }
            Envelope::Offer { sdp } => self.apply_offer(SessionDescription::offer(sdp)).await,
            Envelope::Answer { sdp } => self.apply_answer(SessionDescription::answer(sdp)).await,
            Envelope::IceCandidate { candidate } => self.apply_candidate(candidate).await,
        };

        match &result {
            Ok(()) => self.violations = 0,
            Err(e) => self.record_violation(e),
        }
        result
    }

    /// Queues a locally gathered candidate for the relay.
    pub fn on_local_candidate(&mut self, candidate: IceCandidate) {
        if self.state == SignalingState::Closed {
            return;
        }
        self.outbound.push(candidate.into());
    }

    pub fn on_peer_state(&mut self, state: PeerConnectionState) {
        debug!(session = %self.id, "Peer connection state: {:?}", state);
        match state {
            PeerConnectionState::Failed | PeerConnectionState::Closed if !self.state.is_terminal() => {
                self.fail("media path lost");
            }
            _ => {}
        }
    }

    /// Explicit teardown. Pending candidates and unsent envelopes are dropped.
    pub async fn close(&mut self) {
        if self.state == SignalingState::Closed {
            return;
        }
        let dropped = self.candidates.clear();
        if dropped > 0 {
            debug!(session = %self.id, "Discarding {} buffered candidates", dropped);
        }
        self.outbound.clear();
        if let Err(e) = self.peer.close().await {
            warn!(session = %self.id, "Peer close failed: {:#}", e);
        }
        self.transition(SignalingState::Closed);
    }

    async fn apply_offer(&mut self, offer: SessionDescription) -> Result<(), NegotiationError> {
        match self.state {
            SignalingState::Idle if self.local_description.is_none() => {}
            SignalingState::Idle | SignalingState::HaveLocalOffer => {
                return Err(NegotiationError::Glare);
            }
            state => return Err(NegotiationError::UnexpectedOffer(state)),
        }

        self.commit_remote(offer).await?;

        let created = self.peer.create_answer().await;
        let answer = self.check("create answer", created)?;
        let committed = self.peer.set_local_description(answer.clone()).await;
        self.check("set local answer", committed)?;

        self.local_description = Some(answer.clone());
        self.local_committed = true;
        self.outbound.push(answer.into());
        self.transition(SignalingState::StableConnected);
        Ok(())
    }

    async fn apply_answer(&mut self, answer: SessionDescription) -> Result<(), NegotiationError> {
        match self.state {
            SignalingState::HaveLocalOffer => {}
            SignalingState::Idle if self.holds_uncommitted_offer() => {
                if self.reasserted {
                    return Err(NegotiationError::UnexpectedAnswer(self.state));
                }
                self.reasserted = true;
                self.reassert_offer().await?;
            }
            state => return Err(NegotiationError::UnexpectedAnswer(state)),
        }

        self.commit_remote(answer).await?;
        self.transition(SignalingState::StableConnected);
        Ok(())
    }

    async fn apply_candidate(&mut self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        if !self.seen_candidates.insert(candidate.clone()) {
            debug!(session = %self.id, "Ignoring duplicate candidate");
            return Ok(());
        }

        if self.remote_description.is_none() {
            self.candidates.push(candidate);
            debug!(session = %self.id, buffered = self.candidates.len(), "Buffered remote candidate");
            return Ok(());
        }

        if let Err(e) = self.peer.add_ice_candidate(candidate).await {
            warn!(session = %self.id, "Discarding remote candidate: {:#}", e);
        }
        Ok(())
    }

    fn holds_uncommitted_offer(&self) -> bool {
        !self.local_committed
            && matches!(&self.local_description, Some(desc) if desc.kind == SdpType::Offer)
    }

    async fn reassert_offer(&mut self) -> Result<(), NegotiationError> {
        let Some(offer) = self.local_description.clone() else {
            return Err(NegotiationError::UnexpectedAnswer(self.state));
        };
        info!(session = %self.id, "Re-asserting local offer before applying answer");
        match self.peer.set_local_description(offer).await {
            Ok(()) => {
                self.local_committed = true;
                self.transition(SignalingState::HaveLocalOffer);
                Ok(())
            }
            Err(e) => Err(NegotiationError::ReassertFailed(format!("{e:#}"))),
        }
    }

    /// Sets the remote description, then replays buffered candidates.
    async fn commit_remote(&mut self, desc: SessionDescription) -> Result<(), NegotiationError> {
        if self.remote_description.is_some() {
            return Err(NegotiationError::RemoteAlreadySet);
        }

        let kind = desc.kind;
        let committed = self.peer.set_remote_description(desc.clone()).await;
        self.check("set remote description", committed)?;
        self.remote_description = Some(desc);
        if kind == SdpType::Offer {
            self.transition(SignalingState::HaveRemoteOffer);
        }

        let pending: Vec<IceCandidate> = self.candidates.drain().collect();
        if !pending.is_empty() {
            debug!(session = %self.id, "Applying {} buffered candidates", pending.len());
        }
        for candidate in pending {
            if let Err(e) = self.peer.add_ice_candidate(candidate).await {
                warn!(session = %self.id, "Discarding buffered candidate: {:#}", e);
            }
        }
        Ok(())
    }

    /// Media-stack failures on descriptions are fatal for the session.
    fn check<T>(&mut self, op: &'static str, result: anyhow::Result<T>) -> Result<T, NegotiationError> {
        result.map_err(|e| {
            let err = NegotiationError::peer(op, e);
            self.fail(op);
            err
        })
    }

    fn record_violation(&mut self, err: &NegotiationError) {
        if !err.is_violation() || self.state.is_terminal() {
            return;
        }
        self.violations += 1;
        warn!(
            session = %self.id,
            violations = self.violations,
            "Protocol violation: {}", err
        );
        if self.violations >= MAX_CONSECUTIVE_VIOLATIONS {
            self.fail("too many protocol violations");
        }
    }

    fn fail(&mut self, reason: &str) {
        if self.state.is_terminal() {
            return;
        }
        warn!(session = %self.id, "Negotiation failed: {}", reason);
        self.transition(SignalingState::Failed);
    }

    fn transition(&mut self, next: SignalingState) {
        if self.state == next {
            return;
        }
        info!(session = %self.id, role = %self.role, "{} -> {}", self.state, next);
        self.state = next;
        self.state_tx.send_replace(next);
    }
}
