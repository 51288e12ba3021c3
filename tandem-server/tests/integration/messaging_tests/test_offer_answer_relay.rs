use tandem_core::Envelope;

use crate::integration::init_tracing;
use crate::utils::{SIGNAL_TIMEOUT_MS, SILENCE_MS, TestClient, TestRelay, candidate};

#[tokio::test]
async fn test_offer_answer_relay() {
    init_tracing();

    let relay = TestRelay::spawn().await.expect("Failed to spawn relay");
    let url = relay.ws_url(Some("ABC123"));

    // Desktop waits in the room first, then the phone arrives
    let (mut desktop, _) = TestClient::join(&url).await.expect("Desktop failed to join");
    let (mut phone, _) = TestClient::join(&url).await.expect("Phone failed to join");

    let offer = Envelope::Offer {
        sdp: "v=0\r\no=- 1 2 IN IP4 127.0.0.1\r\n".into(),
    };
    phone.send(&offer).await.expect("Failed to send offer");
    phone
        .send(&Envelope::from(candidate(1)))
        .await
        .expect("Failed to send candidate");

    assert_eq!(desktop.recv(SIGNAL_TIMEOUT_MS).await.unwrap(), offer);
    assert_eq!(
        desktop.recv(SIGNAL_TIMEOUT_MS).await.unwrap(),
        Envelope::from(candidate(1))
    );

    let answer = Envelope::Answer {
        sdp: "v=0\r\no=- 3 4 IN IP4 127.0.0.1\r\n".into(),
    };
    desktop.send(&answer).await.expect("Failed to send answer");

    assert_eq!(phone.recv(SIGNAL_TIMEOUT_MS).await.unwrap(), answer);

    // Neither side hears its own envelopes back
    assert!(phone.is_silent_for(SILENCE_MS).await);
    assert!(desktop.is_silent_for(SILENCE_MS).await);

    phone.close().await.expect("Failed to close phone");
    desktop.close().await.expect("Failed to close desktop");
}
