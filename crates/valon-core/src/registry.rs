//! Registry of connected sessions.

use crate::{Result, ValonError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;
use valon_types::Session;

/// Owns every live [`Session`]. Each operation takes the lock once, so the
/// count seen by readers always matches some prior sequence of
/// register/unregister calls.
pub struct SessionRegistry {
    max_sessions: usize,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            max_sessions,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Session>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new connection. Duplicate ids and a full registry are rejected.
    pub fn register(
        &self,
        id: Uuid,
        remote_address: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Session> {
        let mut sessions = self.write();
        if sessions.len() >= self.max_sessions && !sessions.contains_key(&id) {
            warn!(target: "valon::registry", "Rejecting session {}: limit of {} reached", id, self.max_sessions);
            return Err(ValonError::SessionLimitExceeded(self.max_sessions));
        }

        match sessions.entry(id) {
            Entry::Occupied(_) => {
                warn!(target: "valon::registry", "Rejecting duplicate registration for session {}", id);
                Err(ValonError::SessionAlreadyExists(id))
            }
            Entry::Vacant(slot) => {
                let session = Session::new(id, remote_address, now);
                info!(target: "valon::registry", "Session {} connected from {}", id, session.remote_address);
                Ok(slot.insert(session).clone())
            }
        }
    }

    /// Remove a session. Absent ids are ignored.
    pub fn unregister(&self, id: Uuid) -> Option<Session> {
        let removed = self.write().remove(&id);
        match &removed {
            Some(session) => info!(
                target: "valon::registry",
                "Session {} disconnected after {} commands",
                id, session.commands_issued
            ),
            None => debug!(target: "valon::registry", "Unregister for unknown session {}", id),
        }
        removed
    }

    /// Bump a session's command counter. Returns the new count, or `None`
    /// if the session already disconnected.
    pub fn record_command(&self, id: Uuid) -> Option<u64> {
        let mut sessions = self.write();
        let session = sessions.get_mut(&id)?;
        session.commands_issued += 1;
        Some(session.commands_issued)
    }

    pub fn get(&self, id: Uuid) -> Option<Session> {
        self.read().get(&id).cloned()
    }

    pub fn active_count(&self) -> usize {
        self.read().len()
    }

    pub fn list_ids(&self) -> Vec<Uuid> {
        self.read().keys().copied().collect()
    }

    /// All sessions ordered by connection time.
    pub fn list(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.read().values().cloned().collect();
        sessions.sort_by_key(|s| s.connected_at);
        sessions
    }
}
