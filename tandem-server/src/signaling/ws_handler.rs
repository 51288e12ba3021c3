use crate::room::MemberConnection;
use crate::signaling::RelayService;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tandem_core::{ConnectionId, Envelope, RoomId};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Connection parameters, taken from the upgrade request's query string.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub room: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(service): State<RelayService>,
) -> impl IntoResponse {
    let room_id = RoomId::from_param(params.room.as_deref());

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, service))
}

async fn handle_socket(mut socket: WebSocket, room_id: RoomId, service: RelayService) {
    let connection_id = ConnectionId::new();
    info!(room = %room_id, connection = %connection_id, "New relay connection");

    if room_id.len() > service.config().max_room_id_len {
        warn!(connection = %connection_id, len = room_id.len(), "Room id too long, refusing");
        if let Some(frame) = envelope_frame(&Envelope::error("room id too long")) {
            let _ = socket.send(frame).await;
        }
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::POLICY,
                reason: "room id too long".into(),
            })))
            .await;
        return;
    }

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Queued before joining, so nothing forwarded by the room can overtake it.
    let welcome = Envelope::Welcome {
        room_id: room_id.clone(),
        message: service.config().welcome_message.clone(),
    };
    let Some(frame) = envelope_frame(&welcome) else {
        return;
    };
    let _ = tx.send(frame);

    service
        .registry()
        .join(&room_id, MemberConnection::new(connection_id, tx.clone()));

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let room_id = room_id.clone();

        async move {
            while let Some(frame) = receiver.next().await {
                let msg = match frame {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!(connection = %connection_id, "Transport error: {}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => relay_text(&service, &room_id, connection_id, &tx, text),
                    Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => relay_text(&service, &room_id, connection_id, &tx, text.into()),
                        Err(_) => reject(&tx, connection_id, "binary frame is not UTF-8"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.registry().leave(&room_id, connection_id);
    info!(room = %room_id, connection = %connection_id, "Relay connection closed");
}

/// Validates one inbound frame and forwards the original text untouched.
fn relay_text(
    service: &RelayService,
    room_id: &RoomId,
    connection_id: ConnectionId,
    reply: &mpsc::UnboundedSender<Message>,
    text: Utf8Bytes,
) {
    match Envelope::parse(text.as_str()) {
        Ok(envelope) => {
            let delivered =
                service
                    .registry()
                    .broadcast(room_id, connection_id, Message::Text(text));
            debug!(
                room = %room_id,
                connection = %connection_id,
                kind = envelope.kind(),
                delivered,
                "Forwarded envelope"
            );
        }
        Err(e) => reject(reply, connection_id, &e.to_string()),
    }
}

fn reject(reply: &mpsc::UnboundedSender<Message>, connection_id: ConnectionId, reason: &str) {
    warn!(connection = %connection_id, "Dropping inbound message: {}", reason);
    if let Some(frame) = envelope_frame(&Envelope::error(reason)) {
        let _ = reply.send(frame);
    }
}

fn envelope_frame(envelope: &Envelope) -> Option<Message> {
    match envelope.to_json() {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            error!("Failed to serialize {} envelope: {}", envelope.kind(), e);
            None
        }
    }
}
