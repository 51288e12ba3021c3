use tandem_core::Envelope;

use crate::integration::init_tracing;
use crate::utils::{SIGNAL_TIMEOUT_MS, SILENCE_MS, TestClient, TestRelay};

#[tokio::test]
async fn test_binary_envelope() {
    init_tracing();

    let relay = TestRelay::spawn().await.expect("Failed to spawn relay");
    let url = relay.ws_url(Some("bin"));

    let (mut sender, _) = TestClient::join(&url).await.expect("Failed to join");
    let (mut receiver, _) = TestClient::join(&url).await.expect("Failed to join");

    // UTF-8 JSON in a binary frame is still an envelope
    let answer = Envelope::Answer { sdp: "v=0".into() };
    let json = answer.to_json().unwrap();
    sender
        .send_binary(json.into_bytes())
        .await
        .expect("Send failed");
    assert_eq!(receiver.recv(SIGNAL_TIMEOUT_MS).await.unwrap(), answer);

    // Arbitrary bytes are not
    sender
        .send_binary((0..=255).collect())
        .await
        .expect("Send failed");
    let reply = sender.recv(SIGNAL_TIMEOUT_MS).await.expect("No error reply");
    assert!(matches!(reply, Envelope::Error { .. }));
    assert!(receiver.is_silent_for(SILENCE_MS).await);

    sender.close().await.expect("Failed to close");
    receiver.close().await.expect("Failed to close");
}
