use tandem_client::{ClientEvent, Role, SessionId, SignalingState};
use tandem_core::RoomId;

use crate::integration::init_tracing;
use crate::utils::{
    FakePeerFactory, MemoryRelay, PeerCall, client_config, spawn_client, wait_for_event,
    wait_until,
};

#[tokio::test]
async fn test_close_stops_client() {
    init_tracing();

    let relay = MemoryRelay::new();
    let room = RoomId::from("ABC123");
    let peers = FakePeerFactory::new("desktop", vec![]);
    let (desktop, mut events) = spawn_client(
        client_config("mem://relay", "ABC123", Role::Answerer),
        relay.connector(),
        peers.clone(),
    );
    wait_for_event(&mut events, |e| matches!(e, ClientEvent::Joined(_)))
        .await
        .expect("Never joined");
    assert_eq!(relay.member_count(&room), 1);

    desktop.close().await;

    let mut rest = Vec::new();
    while let Some(event) = events.recv().await {
        rest.push(event);
    }
    assert!(rest.contains(&ClientEvent::SessionState {
        session: SessionId(1),
        state: SignalingState::Closed,
    }));

    let peer = peers.latest().await.unwrap();
    assert!(peer.calls().await.contains(&PeerCall::Close));

    wait_until(|| {
        let relay = relay.clone();
        let room = room.clone();
        async move { relay.member_count(&room) == 0 }
    })
    .await
    .expect("Relay still holds the member");
}
