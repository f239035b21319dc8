use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::connection::ConnectionHandle;
use super::session::CollabSession;

/// Process-wide registry of live collaboration sessions, keyed by schema id.
///
/// The map is sharded, so joins and leaves on different schemas never
/// contend, while operations on one schema id serialize on its shard.
/// Sessions exist exactly while they have participants: `join` creates on
/// demand and `remove_if_empty` garbage-collects, both under the shard lock
/// so the two can never interleave into a participant stranded in a removed
/// session.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Arc<CollabSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the session for a schema and add the participant to it.
    /// Callers authorize before calling; the store never does.
    pub fn join(
        &self,
        schema_id: &str,
        user_id: &str,
        handle: ConnectionHandle,
    ) -> Arc<CollabSession> {
        let entry = self
            .sessions
            .entry(schema_id.to_string())
            .or_insert_with(|| {
                info!("Creating collaboration session for schema '{}'", schema_id);
                Arc::new(CollabSession::new(schema_id))
            });
        // Insert while the shard is held so a racing removal cannot drop the
        // session between creation and the participant landing in it.
        entry.add_participant(user_id, handle);
        entry.value().clone()
    }

    pub fn get(&self, schema_id: &str) -> Option<Arc<CollabSession>> {
        self.sessions.get(schema_id).map(|s| s.clone())
    }

    /// Drop the session if it has no participants left.
    pub fn remove_if_empty(&self, schema_id: &str) {
        let removed = self
            .sessions
            .remove_if(schema_id, |_, session| session.is_empty());
        if removed.is_some() {
            debug!("Destroyed empty session for schema '{}'", schema_id);
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn participant_count(&self) -> usize {
        self.sessions
            .iter()
            .map(|entry| entry.participant_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> ConnectionHandle {
        ConnectionHandle::new(8).0
    }

    #[test]
    fn join_creates_session_once() {
        let store = SessionStore::new();

        let first = store.join("sch-1", "a", handle());
        let second = store.join("sch-1", "b", handle());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.session_count(), 1);
        assert_eq!(first.participant_count(), 2);
    }

    #[test]
    fn empty_session_is_removed() {
        let store = SessionStore::new();
        let h = handle();
        let session = store.join("sch-1", "a", h.clone());

        assert!(session.remove_participant("a", h.id()));
        store.remove_if_empty("sch-1");

        assert!(store.get("sch-1").is_none());
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn occupied_session_survives_gc_attempt() {
        let store = SessionStore::new();
        let ha = handle();
        store.join("sch-1", "a", ha.clone());
        store.join("sch-1", "b", handle());

        let session = store.get("sch-1").unwrap();
        session.remove_participant("a", ha.id());
        store.remove_if_empty("sch-1");

        // b is still in the session, so it must survive.
        let survivor = store.get("sch-1").unwrap();
        assert_eq!(survivor.participant_count(), 1);
    }

    #[test]
    fn rejoin_keeps_single_participant_entry() {
        let store = SessionStore::new();
        store.join("sch-1", "a", handle());
        let session = store.join("sch-1", "a", handle());

        assert_eq!(session.participant_count(), 1);
        assert_eq!(store.participant_count(), 1);
    }

    #[test]
    fn sessions_are_independent() {
        let store = SessionStore::new();
        let ha = handle();
        store.join("sch-1", "a", ha.clone());
        store.join("sch-2", "a", handle());

        let s1 = store.get("sch-1").unwrap();
        s1.remove_participant("a", ha.id());
        store.remove_if_empty("sch-1");

        assert!(store.get("sch-1").is_none());
        assert!(store.get("sch-2").is_some());
    }
}
