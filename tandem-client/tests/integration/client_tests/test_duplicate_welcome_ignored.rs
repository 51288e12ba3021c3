use std::time::Duration;
use tandem_client::{ClientEvent, Role, SessionId, SignalingState};
use tandem_core::{Envelope, RoomId};

use crate::integration::init_tracing;
use crate::utils::{
    FakePeerFactory, MemoryRelay, PeerCall, client_config, collect_for, spawn_client,
    wait_for_event,
};

#[tokio::test]
async fn test_duplicate_welcome_ignored() {
    init_tracing();

    let relay = MemoryRelay::new();
    let room = RoomId::from("ABC123");
    let phone_peers = FakePeerFactory::new("phone", vec![]);

    let (phone, mut events) = spawn_client(
        client_config("mem://relay", "ABC123", Role::Offerer),
        relay.connector(),
        phone_peers.clone(),
    );
    wait_for_event(&mut events, |e| {
        *e == ClientEvent::SessionState {
            session: SessionId(1),
            state: SignalingState::HaveLocalOffer,
        }
    })
    .await
    .expect("No offer made");

    for _ in 0..2 {
        relay.inject(
            &room,
            Envelope::Welcome {
                room_id: room.clone(),
                message: "Connected to signaling server".into(),
            },
        );
    }

    let later = collect_for(&mut events, Duration::from_millis(300)).await;
    assert!(
        later
            .iter()
            .all(|e| !matches!(e, ClientEvent::SessionState { .. } | ClientEvent::Joined(_))),
        "Repeated welcome changed state: {:?}",
        later
    );

    assert_eq!(phone_peers.created().await, 1);
    let peer = phone_peers.latest().await.unwrap();
    let offers = peer
        .calls()
        .await
        .into_iter()
        .filter(|c| *c == PeerCall::CreateOffer)
        .count();
    assert_eq!(offers, 1);

    phone.close().await;
}
