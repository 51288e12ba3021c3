use tandem_core::RoomId;

use crate::integration::init_tracing;
use crate::utils::{SIGNAL_TIMEOUT_MS, TestClient, TestRelay, wait_for_members};

#[tokio::test]
async fn test_peer_disconnect_triggers_leave() {
    init_tracing();

    let relay = TestRelay::spawn().await.expect("Failed to spawn relay");
    let room = RoomId::from("leave-me");

    let (client, _) = TestClient::join(&relay.ws_url(Some("leave-me")))
        .await
        .expect("Failed to join");
    assert!(relay.service.registry().contains(&room));

    client.close().await.expect("Failed to close client");

    // Last member gone: the room must disappear from the registry
    wait_for_members(&relay.service, &room, 0, SIGNAL_TIMEOUT_MS)
        .await
        .expect("Member was not removed");
    assert!(!relay.service.registry().contains(&room));
}

#[tokio::test]
async fn test_dropped_socket_triggers_leave() {
    init_tracing();

    let relay = TestRelay::spawn().await.expect("Failed to spawn relay");
    let room = RoomId::from("abrupt");

    let (client, _) = TestClient::join(&relay.ws_url(Some("abrupt")))
        .await
        .expect("Failed to join");

    // No close handshake, the TCP stream just goes away
    drop(client);

    wait_for_members(&relay.service, &room, 0, SIGNAL_TIMEOUT_MS)
        .await
        .expect("Member was not removed after transport loss");
}
