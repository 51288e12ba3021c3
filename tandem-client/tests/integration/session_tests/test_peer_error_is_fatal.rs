use std::sync::Arc;
use tandem_client::{NegotiationError, NegotiationSession, Role, SessionId, SignalingState};
use tandem_core::Envelope;

use crate::integration::init_tracing;
use crate::utils::{FakePeer, candidate};

#[tokio::test]
async fn test_peer_error_is_fatal() {
    init_tracing();

    let peer = Arc::new(FakePeer::new("desktop").failing_create_answer());
    let mut session = NegotiationSession::new(SessionId(1), Role::Answerer, peer);

    let err = session
        .handle_envelope(Envelope::Offer {
            sdp: "phone-offer-1".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        NegotiationError::Peer {
            op: "create answer",
            ..
        }
    ));
    assert_eq!(session.state(), SignalingState::Failed);
    assert!(session.take_outbound().is_empty());
}

#[tokio::test]
async fn test_rejected_candidate_is_not_fatal() {
    init_tracing();

    let peer = Arc::new(FakePeer::new("desktop").rejecting_candidates());
    let mut session = NegotiationSession::new(SessionId(1), Role::Answerer, peer.clone());

    session
        .handle_envelope(Envelope::IceCandidate {
            candidate: candidate("c", 1),
        })
        .await
        .unwrap();
    session
        .handle_envelope(Envelope::Offer {
            sdp: "phone-offer-1".into(),
        })
        .await
        .expect("Buffered candidate failure should not fail the offer");
    session
        .handle_envelope(Envelope::IceCandidate {
            candidate: candidate("c", 2),
        })
        .await
        .expect("Candidate failure should only be logged");

    assert_eq!(session.state(), SignalingState::StableConnected);
    assert_eq!(peer.applied_candidates().await.len(), 2);
}
