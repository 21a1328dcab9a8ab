use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Outcome of a join call.
#[derive(Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The session was already a member of this room; nothing changed.
    AlreadyMember,
    /// The session was added. If it was in another room before, that room
    /// key is reported so the caller can fire the leave side effects.
    Joined { vacated: Option<String> },
}

/// Authoritative mapping of room key -> member sessions.
///
/// Pure in-memory data structure. The reverse index enforces that a session
/// is in at most one room; callers own all broadcasts and presence updates.
#[derive(Default)]
pub struct RoomRegistry {
    members: HashMap<String, HashSet<Uuid>>,
    room_of: HashMap<Uuid, String>,
}

impl RoomRegistry {
    /// Add a session to a room. Idempotent; joining a second room implicitly
    /// leaves the first.
    pub fn join(&mut self, room_key: &str, session_id: Uuid) -> JoinOutcome {
        if self.room_of.get(&session_id).map(String::as_str) == Some(room_key) {
            return JoinOutcome::AlreadyMember;
        }
        let vacated = self.remove_session(session_id);
        self.members
            .entry(room_key.to_string())
            .or_default()
            .insert(session_id);
        self.room_of.insert(session_id, room_key.to_string());
        JoinOutcome::Joined { vacated }
    }

    /// Remove a session from a room. Idempotent; removing a non-member is a
    /// no-op. Returns whether the membership actually changed.
    pub fn leave(&mut self, room_key: &str, session_id: Uuid) -> bool {
        let removed = match self.members.get_mut(room_key) {
            Some(set) => set.remove(&session_id),
            None => false,
        };
        if removed {
            self.room_of.remove(&session_id);
            // Rooms exist only while they have members.
            if self.members.get(room_key).is_some_and(HashSet::is_empty) {
                self.members.remove(room_key);
            }
        }
        removed
    }

    /// Remove a session from whatever room it is in, returning that room key.
    /// Used by the disconnect cleanup path.
    pub fn remove_session(&mut self, session_id: Uuid) -> Option<String> {
        let room_key = self.room_of.get(&session_id).cloned()?;
        self.leave(&room_key, session_id);
        Some(room_key)
    }

    /// Current members of a room, snapshotted at call time.
    pub fn members_of(&self, room_key: &str) -> Vec<Uuid> {
        self.members
            .get(room_key)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Room the session currently belongs to, if any.
    pub fn room_of(&self, session_id: Uuid) -> Option<&str> {
        self.room_of.get(&session_id).map(String::as_str)
    }

    pub fn room_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_idempotent() {
        let mut registry = RoomRegistry::default();
        let s = Uuid::new_v4();

        assert_eq!(
            registry.join("proj-1", s),
            JoinOutcome::Joined { vacated: None }
        );
        assert_eq!(registry.join("proj-1", s), JoinOutcome::AlreadyMember);
        assert_eq!(registry.members_of("proj-1"), vec![s]);
    }

    #[test]
    fn joining_second_room_vacates_first() {
        let mut registry = RoomRegistry::default();
        let s = Uuid::new_v4();

        registry.join("proj-1", s);
        assert_eq!(
            registry.join("proj-2", s),
            JoinOutcome::Joined {
                vacated: Some("proj-1".to_string())
            }
        );
        assert!(registry.members_of("proj-1").is_empty());
        assert_eq!(registry.members_of("proj-2"), vec![s]);
        assert_eq!(registry.room_of(s), Some("proj-2"));
    }

    #[test]
    fn leave_of_non_member_is_a_no_op() {
        let mut registry = RoomRegistry::default();
        let s = Uuid::new_v4();
        let other = Uuid::new_v4();

        registry.join("proj-1", s);
        assert!(!registry.leave("proj-1", other));
        assert!(!registry.leave("proj-9", s));
        assert_eq!(registry.members_of("proj-1"), vec![s]);

        // Double-leave from explicit leave plus disconnect cleanup.
        assert!(registry.leave("proj-1", s));
        assert!(!registry.leave("proj-1", s));
    }

    #[test]
    fn empty_rooms_are_dropped() {
        let mut registry = RoomRegistry::default();
        let s = Uuid::new_v4();

        registry.join("proj-1", s);
        assert_eq!(registry.room_count(), 1);
        registry.leave("proj-1", s);
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn remove_session_reports_vacated_room() {
        let mut registry = RoomRegistry::default();
        let s = Uuid::new_v4();

        assert_eq!(registry.remove_session(s), None);
        registry.join("proj-1", s);
        assert_eq!(registry.remove_session(s), Some("proj-1".to_string()));
        assert_eq!(registry.room_of(s), None);
    }
}
