use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tandem_core::{Envelope, RoomId};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, info, warn};
use url::Url;

use super::{RelayConnector, RelayEvent, RelayLink};

/// Relay connector over a WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

/// `ws://host/ws` plus `?room=<id>`, keeping any existing query pairs.
pub fn room_url(relay_url: &str, room: &RoomId) -> Result<Url> {
    let mut url = Url::parse(relay_url).with_context(|| format!("Invalid relay url {}", relay_url))?;
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "room")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(others)
        .append_pair("room", room.as_str());
    Ok(url)
}

#[async_trait]
impl RelayConnector for WsConnector {
    async fn connect(&self, relay_url: &str, room: &RoomId) -> Result<RelayLink> {
        let url = room_url(relay_url, room)?;
        let (ws, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to relay at {}", url))?;
        info!(%room, "Connected to relay");

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Envelope>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<RelayEvent>();

        tokio::spawn(async move {
            while let Some(envelope) = out_rx.recv().await {
                let json = match envelope.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode {}: {}", envelope.kind(), e);
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            let abnormal = loop {
                let event = match stream.next().await {
                    Some(Ok(Message::Text(text))) => match Envelope::parse(text.as_str()) {
                        Ok(envelope) => RelayEvent::Envelope(envelope),
                        Err(e) => RelayEvent::Malformed(e.to_string()),
                    },
                    Some(Ok(Message::Binary(bytes))) => match Envelope::parse_bytes(&bytes) {
                        Ok(envelope) => RelayEvent::Envelope(envelope),
                        Err(e) => RelayEvent::Malformed(e.to_string()),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        debug!("Relay closed: {:?}", frame);
                        break !matches!(frame, Some(f) if f.code == CloseCode::Normal);
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("Relay transport error: {}", e);
                        break true;
                    }
                    None => break true,
                };
                if in_tx.send(event).is_err() {
                    return;
                }
            };
            let _ = in_tx.send(RelayEvent::Closed { abnormal });
        });

        Ok(RelayLink {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
