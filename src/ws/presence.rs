use chrono::Utc;
use std::collections::HashMap;

use crate::models::{PresencePatch, PresenceRecord};

/// Per-room projection of membership into human-facing presence info.
///
/// Exactly one record exists per (room, userId). Partial updates merge into
/// the existing record; a patch for a user with no record is dropped, which
/// is what makes removal win over a stale in-flight update.
#[derive(Default)]
pub struct PresenceStore {
    rooms: HashMap<String, HashMap<String, PresenceRecord>>,
}

impl PresenceStore {
    /// Insert the full record for a user joining a room. Replaces any record
    /// left over from a previous session of the same user.
    pub fn seed(&mut self, room_key: &str, record: PresenceRecord) {
        self.rooms
            .entry(room_key.to_string())
            .or_default()
            .insert(record.user_id.clone(), record);
    }

    /// Merge a partial update into an existing record, refreshing last-seen.
    /// Returns false when no record exists (the user already left).
    pub fn merge(&mut self, room_key: &str, user_id: &str, patch: &PresencePatch) -> bool {
        let Some(record) = self
            .rooms
            .get_mut(room_key)
            .and_then(|room| room.get_mut(user_id))
        else {
            return false;
        };
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(cursor) = &patch.cursor {
            record.cursor = Some(cursor.clone());
        }
        record.last_seen = Utc::now();
        true
    }

    /// Delete a user's record. Idempotent so the graceful-leave and
    /// heartbeat-timeout paths can both call it.
    pub fn remove(&mut self, room_key: &str, user_id: &str) -> bool {
        let Some(room) = self.rooms.get_mut(room_key) else {
            return false;
        };
        let removed = room.remove(user_id).is_some();
        if room.is_empty() {
            self.rooms.remove(room_key);
        }
        removed
    }

    /// Whether a record exists for this user in this room.
    pub fn contains(&self, room_key: &str, user_id: &str) -> bool {
        self.rooms
            .get(room_key)
            .is_some_and(|room| room.contains_key(user_id))
    }

    /// All current records of a room, ordered by user id so a joining client
    /// always sees a deterministic list.
    pub fn snapshot(&self, room_key: &str) -> Vec<PresenceRecord> {
        let mut members: Vec<PresenceRecord> = self
            .rooms
            .get(room_key)
            .map(|room| room.values().cloned().collect())
            .unwrap_or_default();
        members.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        members
    }

    pub fn record_count(&self) -> usize {
        self.rooms.values().map(HashMap::len).sum()
    }
}
