use crate::room::member::MemberConnection;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tandem_core::ConnectionId;

/// Membership of a single room.
#[derive(Debug, Default)]
pub struct Room {
    members: HashMap<ConnectionId, MemberConnection>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the connection was already a member.
    pub fn insert(&mut self, member: MemberConnection) -> bool {
        match self.members.entry(member.id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(member);
                true
            }
        }
    }

    pub fn remove(&mut self, id: &ConnectionId) -> bool {
        self.members.remove(id).is_some()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.members.keys().copied().collect()
    }

    /// Every member except `sender`.
    pub fn others<'a>(
        &'a self,
        sender: &'a ConnectionId,
    ) -> impl Iterator<Item = &'a MemberConnection> + 'a {
        self.members
            .iter()
            .filter(move |(id, _)| *id != sender)
            .map(|(_, member)| member)
    }
}
