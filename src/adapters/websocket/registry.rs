//! Session registry for live streaming connections.
//!
//! The only state shared between connections. Each connection touches only its
//! own key, so distinct connections never contend on a lock.

use dashmap::DashMap;

use crate::domain::conversation::Session;
use crate::domain::foundation::ConnectionId;

/// Concurrent map from connection id to its bound session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session under its connection id.
    pub fn put(&self, session: Session) {
        self.sessions.insert(session.connection_id(), session);
    }

    /// Returns a copy of the session, if registered.
    ///
    /// The map guard is released before returning.
    pub fn get(&self, connection_id: &ConnectionId) -> Option<Session> {
        self.sessions.get(connection_id).map(|entry| entry.value().clone())
    }

    /// Removes a session. Removing an absent id is a no-op.
    pub fn remove(&self, connection_id: &ConnectionId) -> Option<Session> {
        self.sessions.remove(connection_id).map(|(_, session)| session)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.sessions.contains_key(connection_id)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
