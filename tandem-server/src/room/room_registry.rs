use crate::room::{MemberConnection, Room};
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{ConnectionId, RoomId, RoomSummary};
use tracing::{info, warn};

/// Result of [`RoomRegistry::join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomHandle {
    pub room_id: RoomId,
    pub members: usize,
    /// The room did not exist before this join.
    pub created: bool,
    /// `false` when the connection was already a member (join is idempotent).
    pub added: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left { remaining: usize },
    /// The last member left and the room was deleted.
    RoomClosed,
    NotMember,
}

/// Process-wide table of active rooms.
///
/// A room exists iff it has at least one member. Creation, insertion, removal
/// and deletion of a room all happen under the map's shard lock for that
/// room id, so a concurrent join can never land in a room that is being
/// deleted.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, room_id: &RoomId, member: MemberConnection) -> RoomHandle {
        let connection = member.id();
        let mut created = false;

        let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            created = true;
            Room::new()
        });
        let added = room.insert(member);
        let members = room.len();
        drop(room);

        if created {
            info!(room = %room_id, "Room created");
        }
        if added {
            info!(room = %room_id, %connection, members, "Client joined room");
        }

        RoomHandle {
            room_id: room_id.clone(),
            members,
            created,
            added,
        }
    }

    pub fn leave(&self, room_id: &RoomId, connection: ConnectionId) -> LeaveOutcome {
        let mut outcome = LeaveOutcome::NotMember;

        self.rooms.remove_if_mut(room_id, |_, room| {
            if room.remove(&connection) {
                outcome = if room.is_empty() {
                    LeaveOutcome::RoomClosed
                } else {
                    LeaveOutcome::Left {
                        remaining: room.len(),
                    }
                };
            }
            room.is_empty()
        });

        match outcome {
            LeaveOutcome::Left { remaining } => {
                info!(room = %room_id, %connection, remaining, "Client left room");
            }
            LeaveOutcome::RoomClosed => {
                info!(room = %room_id, %connection, "Client left room, room deleted");
            }
            LeaveOutcome::NotMember => {}
        }

        outcome
    }

    /// Forwards `msg` to every member of the room except `sender`.
    ///
    /// Membership is snapshotted first and the lock released before any send,
    /// so a slow or dead member never holds up the room. Returns how many
    /// members the frame was queued for. An absent room is a no-op.
    pub fn broadcast(&self, room_id: &RoomId, sender: ConnectionId, msg: Message) -> usize {
        let targets: Vec<MemberConnection> = match self.rooms.get(room_id) {
            Some(room) => room.others(&sender).cloned().collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for member in targets {
            match member.send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => warn!(
                    room = %room_id,
                    connection = %member.id(),
                    "Failed to forward to member, writer is gone"
                ),
            }
        }
        delivered
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn member_count(&self, room_id: &RoomId) -> Option<usize> {
        self.rooms.get(room_id).map(|room| room.len())
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| room.member_ids())
            .unwrap_or_default()
    }

    pub fn is_member(&self, room_id: &RoomId, connection: &ConnectionId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|room| room.contains(connection))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Snapshot for diagnostics, sorted by room id.
    pub fn summaries(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .rooms
            .iter()
            .map(|entry| RoomSummary {
                id: entry.key().clone(),
                clients: entry.value().len(),
            })
            .collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        rooms
    }
}
