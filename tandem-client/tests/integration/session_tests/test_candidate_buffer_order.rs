use std::sync::Arc;
use tandem_client::{NegotiationSession, Role, SessionId, SignalingState};
use tandem_core::Envelope;

use crate::integration::init_tracing;
use crate::utils::{FakePeer, PeerCall, candidate};

#[tokio::test]
async fn test_candidate_buffer_order() {
    init_tracing();

    let peer = Arc::new(FakePeer::new("desktop"));
    let mut session = NegotiationSession::new(SessionId(1), Role::Answerer, peer.clone());

    // Candidates outrun the offer.
    for n in 1..=3 {
        session
            .handle_envelope(Envelope::IceCandidate {
                candidate: candidate("c", n),
            })
            .await
            .expect("Candidate rejected");
    }
    assert_eq!(session.buffered_candidates(), 3);
    assert!(peer.applied_candidates().await.is_empty());

    session
        .handle_envelope(Envelope::Offer {
            sdp: "phone-offer-1".into(),
        })
        .await
        .expect("Offer rejected");

    assert_eq!(session.state(), SignalingState::StableConnected);
    assert_eq!(session.buffered_candidates(), 0);
    assert_eq!(
        peer.applied_candidates().await,
        vec![candidate("c", 1), candidate("c", 2), candidate("c", 3)]
    );

    // Buffered candidates are applied right after the remote description.
    let calls = peer.calls().await;
    assert!(matches!(calls[0], PeerCall::SetRemote(_)));
    assert!(matches!(calls[1], PeerCall::AddCandidate(_)));
    assert!(matches!(calls[4], PeerCall::CreateAnswer));

    // The answer goes out.
    let outbound = session.take_outbound();
    assert_eq!(
        outbound,
        vec![Envelope::Answer {
            sdp: "desktop-answer-1".into()
        }]
    );

    // Later candidates go straight through.
    session
        .handle_envelope(Envelope::IceCandidate {
            candidate: candidate("c", 4),
        })
        .await
        .expect("Candidate rejected");
    assert_eq!(session.buffered_candidates(), 0);
    assert_eq!(peer.applied_candidates().await.len(), 4);
}
