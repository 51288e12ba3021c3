use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tandem_client::{RelayConnector, RelayEvent, RelayLink};
use tandem_core::{Envelope, RoomId};
use tokio::sync::mpsc;

struct Member {
    id: u64,
    inbound: mpsc::UnboundedSender<RelayEvent>,
}

#[derive(Default)]
struct RelayState {
    rooms: HashMap<RoomId, Vec<Member>>,
    next_id: u64,
    connects: u32,
    refusing: bool,
}

/// In-process relay: welcome on join, then every envelope a member sends is
/// delivered to the other members of its room.
#[derive(Clone, Default)]
pub struct MemoryRelay {
    state: Arc<Mutex<RelayState>>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> Arc<dyn RelayConnector> {
        Arc::new(self.clone())
    }

    /// Connection attempts so far, refused ones included.
    pub fn connects(&self) -> u32 {
        self.state.lock().unwrap().connects
    }

    pub fn set_refusing(&self, refusing: bool) {
        self.state.lock().unwrap().refusing = refusing;
    }

    pub fn member_count(&self, room: &RoomId) -> usize {
        self.state
            .lock()
            .unwrap()
            .rooms
            .get(room)
            .map_or(0, |members| members.len())
    }

    /// Delivers `envelope` to every member of `room`.
    pub fn inject(&self, room: &RoomId, envelope: Envelope) {
        let state = self.state.lock().unwrap();
        for member in state.rooms.get(room).into_iter().flatten() {
            let _ = member.inbound.send(RelayEvent::Envelope(envelope.clone()));
        }
    }

    /// Drops every connection in every room.
    pub fn disconnect_all(&self, abnormal: bool) {
        let mut state = self.state.lock().unwrap();
        for (_, members) in state.rooms.drain() {
            for member in members {
                let _ = member.inbound.send(RelayEvent::Closed { abnormal });
            }
        }
    }

    fn forward(&self, room: &RoomId, sender: u64, envelope: Envelope) {
        let state = self.state.lock().unwrap();
        for member in state.rooms.get(room).into_iter().flatten() {
            if member.id != sender {
                let _ = member.inbound.send(RelayEvent::Envelope(envelope.clone()));
            }
        }
    }

    fn leave(&self, room: &RoomId, id: u64) {
        let mut state = self.state.lock().unwrap();
        if let Some(members) = state.rooms.get_mut(room) {
            members.retain(|m| m.id != id);
            if members.is_empty() {
                state.rooms.remove(room);
            }
        }
    }
}

#[async_trait]
impl RelayConnector for MemoryRelay {
    async fn connect(&self, _relay_url: &str, room: &RoomId) -> Result<RelayLink> {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Envelope>();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        let id = {
            let mut state = self.state.lock().unwrap();
            state.connects += 1;
            if state.refusing {
                bail!("connection refused");
            }
            state.next_id += 1;
            let id = state.next_id;

            let _ = in_tx.send(RelayEvent::Envelope(Envelope::Welcome {
                room_id: room.clone(),
                message: "Connected to signaling server".to_string(),
            }));
            state.rooms.entry(room.clone()).or_default().push(Member {
                id,
                inbound: in_tx,
            });
            id
        };

        let relay = self.clone();
        let room = room.clone();
        tokio::spawn(async move {
            while let Some(envelope) = out_rx.recv().await {
                relay.forward(&room, id, envelope);
            }
            relay.leave(&room, id);
        });

        Ok(RelayLink {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
