use tandem_client::{ClientEvent, ClientStatus, Role, SessionId, SignalingState};
use tandem_core::SessionDescription;

use crate::integration::init_tracing;
use crate::utils::{
    FakePeerFactory, MemoryRelay, PeerCall, client_config, spawn_client, wait_for_event,
    wait_for_status,
};

#[tokio::test]
async fn test_answerer_switch_renegotiates() {
    init_tracing();

    let relay = MemoryRelay::new();
    let desktop_peers = FakePeerFactory::new("desktop", vec![]);
    let phone_peers = FakePeerFactory::new("phone", vec![]);

    let (desktop, mut desktop_events) = spawn_client(
        client_config("mem://relay", "ABC123", Role::Answerer),
        relay.connector(),
        desktop_peers.clone(),
    );
    let (phone, mut phone_events) = spawn_client(
        client_config("mem://relay", "ABC123", Role::Offerer),
        relay.connector(),
        phone_peers.clone(),
    );
    wait_for_status(&desktop, ClientStatus::Connected)
        .await
        .expect("Desktop never connected");
    wait_for_status(&phone, ClientStatus::Connected)
        .await
        .expect("Phone never connected");

    // The desktop switches source; it offers the new round itself.
    desktop.switch_source().expect("Client closed");

    let seen = wait_for_event(&mut desktop_events, |e| {
        *e == ClientEvent::SessionState {
            session: SessionId(2),
            state: SignalingState::StableConnected,
        }
    })
    .await
    .expect("Desktop did not renegotiate");
    assert!(seen.contains(&ClientEvent::Status(ClientStatus::Pending)));
    assert!(seen.contains(&ClientEvent::SessionState {
        session: SessionId(2),
        state: SignalingState::HaveLocalOffer,
    }));
    assert!(!seen.contains(&ClientEvent::Fallback));
    wait_for_status(&desktop, ClientStatus::Connected)
        .await
        .expect("Desktop stuck after switch");

    let seen = wait_for_event(&mut phone_events, |e| {
        *e == ClientEvent::SessionState {
            session: SessionId(2),
            state: SignalingState::StableConnected,
        }
    })
    .await
    .expect("Phone did not answer the new offer");
    assert!(!seen.contains(&ClientEvent::Fallback));
    assert_eq!(phone.status(), ClientStatus::Connected);

    assert_eq!(desktop_peers.roles().await, vec![Role::Answerer, Role::Offerer]);
    assert_eq!(phone_peers.roles().await, vec![Role::Offerer, Role::Answerer]);

    let first_desktop = desktop_peers.peer(0).await.unwrap();
    assert!(first_desktop.calls().await.contains(&PeerCall::Close));

    let second_phone = phone_peers.peer(1).await.unwrap();
    assert_eq!(
        second_phone.remote_descriptions().await,
        vec![SessionDescription::offer("desktop-offer-1")]
    );
    let second_desktop = desktop_peers.peer(1).await.unwrap();
    assert_eq!(
        second_desktop.remote_descriptions().await,
        vec![SessionDescription::answer("phone-answer-1")]
    );

    phone.close().await;
    desktop.close().await;
}
