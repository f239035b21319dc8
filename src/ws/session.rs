use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::connection::ConnectionHandle;

/// Transient collaboration context bound to one schema.
///
/// Holds the live participants and the last-activity marker. The participant
/// map is guarded by a plain mutex; critical sections never await, and
/// fan-out works on a snapshot taken under the lock.
pub struct CollabSession {
    schema_id: String,
    participants: Mutex<HashMap<String, ConnectionHandle>>,
    last_active: AtomicI64,
}

impl CollabSession {
    pub fn new(schema_id: impl Into<String>) -> Self {
        Self {
            schema_id: schema_id.into(),
            participants: Mutex::new(HashMap::new()),
            last_active: AtomicI64::new(Utc::now().timestamp()),
        }
    }

    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    /// Add a participant, replacing any handle the user already had.
    /// Returns the replaced handle if this was a rejoin.
    pub fn add_participant(
        &self,
        user_id: &str,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        self.touch();
        self.participants
            .lock()
            .expect("participant lock poisoned")
            .insert(user_id.to_string(), handle)
    }

    /// Remove the user's participant entry, but only while it still refers
    /// to the given connection. A rejoin from a new connection replaces the
    /// handle, and the old connection's teardown must not evict it.
    pub fn remove_participant(&self, user_id: &str, connection_id: Uuid) -> bool {
        self.touch();
        let mut participants = self.participants.lock().expect("participant lock poisoned");
        match participants.get(user_id) {
            Some(current) if current.id() == connection_id => {
                participants.remove(user_id);
                true
            }
            _ => false,
        }
    }

    /// Snapshot of every participant except the excluded user.
    pub fn other_participants(&self, exclude_user_id: &str) -> Vec<(String, ConnectionHandle)> {
        self.participants
            .lock()
            .expect("participant lock poisoned")
            .iter()
            .filter(|(user_id, _)| user_id.as_str() != exclude_user_id)
            .map(|(user_id, handle)| (user_id.clone(), handle.clone()))
            .collect()
    }

    /// User ids currently in the session.
    pub fn participant_ids(&self) -> Vec<String> {
        self.participants
            .lock()
            .expect("participant lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn participant_count(&self) -> usize {
        self.participants
            .lock()
            .expect("participant lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.participant_count() == 0
    }

    /// Record activity on the session.
    pub fn touch(&self) {
        self.last_active
            .store(Utc::now().timestamp(), Ordering::Relaxed);
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        let secs = self.last_active.load(Ordering::Relaxed);
        Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> ConnectionHandle {
        ConnectionHandle::new(8).0
    }

    #[test]
    fn rejoin_replaces_existing_handle() {
        let session = CollabSession::new("sch-1");
        let first = handle();
        let second = handle();

        assert!(session.add_participant("u1", first.clone()).is_none());
        let replaced = session.add_participant("u1", second.clone());

        assert_eq!(replaced.unwrap().id(), first.id());
        assert_eq!(session.participant_count(), 1);
    }

    #[test]
    fn stale_connection_cannot_evict_replacement() {
        let session = CollabSession::new("sch-1");
        let old = handle();
        let new = handle();

        session.add_participant("u1", old.clone());
        session.add_participant("u1", new.clone());

        // The old connection's teardown runs after the rejoin replaced it.
        assert!(!session.remove_participant("u1", old.id()));
        assert_eq!(session.participant_count(), 1);

        assert!(session.remove_participant("u1", new.id()));
        assert!(session.is_empty());
    }

    #[test]
    fn other_participants_excludes_requested_user() {
        let session = CollabSession::new("sch-1");
        session.add_participant("a", handle());
        session.add_participant("b", handle());
        session.add_participant("c", handle());

        let others: Vec<String> = session
            .other_participants("a")
            .into_iter()
            .map(|(user, _)| user)
            .collect();

        assert_eq!(others.len(), 2);
        assert!(!others.contains(&"a".to_string()));
    }
}
