//! Identity registry: the one piece of shared mutable state in the relay.
//!
//! Maps each live connection's id to its [`Session`]. Every read and write
//! goes through a single `parking_lot::RwLock`, so snapshots and recipient
//! sets are always consistent with the last completed mutation.

use std::collections::HashMap;

use parking_lot::RwLock;
use relay_common::ConnectionId;

use crate::error::RelayError;

use super::connection::Connection;
use super::events::UserEntry;
use super::session::{Session, SessionInfo};

#[derive(Default)]
struct RegistryState {
    sessions: HashMap<ConnectionId, Session>,
    next_join: u64,
}

/// Shared registry of all live sessions.
#[derive(Default)]
pub struct SessionRegistry {
    state: RwLock<RegistryState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly accepted, unregistered connection.
    ///
    /// An id that is already present is rejected and the existing session
    /// is left untouched.
    pub fn add(&self, id: ConnectionId, connection: Connection) -> Result<(), RelayError> {
        let mut state = self.state.write();
        if state.sessions.contains_key(&id) {
            return Err(RelayError::IdCollision(id));
        }
        let joined = state.next_join;
        state.next_join += 1;
        state
            .sessions
            .insert(id.clone(), Session::new(id, connection, joined));
        Ok(())
    }

    /// Set (or overwrite) the display name of a session.
    pub fn set_username(&self, id: &ConnectionId, name: String) -> Result<(), RelayError> {
        let mut state = self.state.write();
        let session = state
            .sessions
            .get_mut(id)
            .ok_or_else(|| RelayError::NotFound(id.clone()))?;
        session.display_name = Some(name);
        Ok(())
    }

    /// Drop a session. Removing an unknown id is a no-op.
    pub fn remove(&self, id: &ConnectionId) -> Option<Session> {
        self.state.write().sessions.remove(id)
    }

    pub fn lookup(&self, id: &ConnectionId) -> Option<SessionInfo> {
        self.state.read().sessions.get(id).map(Session::info)
    }

    /// Registered users in join order. Unregistered sessions and sessions
    /// whose transport has been closed are omitted.
    pub fn snapshot(&self) -> Vec<UserEntry> {
        let state = self.state.read();
        let mut registered: Vec<&Session> = state.sessions.values().filter(|s| listed(s)).collect();
        registered.sort_by_key(|s| s.joined);
        registered
            .into_iter()
            .filter_map(|s| {
                s.display_name.as_ref().map(|name| UserEntry {
                    client_id: s.id.clone(),
                    username: name.clone(),
                })
            })
            .collect()
    }

    /// Every connection whose transport is still open, in join order.
    pub fn open_connections(&self) -> Vec<Connection> {
        self.connections_where(|s| s.connection.is_open())
    }

    /// Every registered connection that is still open, in join order.
    pub fn registered_connections(&self) -> Vec<Connection> {
        self.connections_where(listed)
    }

    fn connections_where(&self, filter: impl Fn(&Session) -> bool) -> Vec<Connection> {
        let state = self.state.read();
        let mut matching: Vec<&Session> = state.sessions.values().filter(|s| filter(*s)).collect();
        matching.sort_by_key(|s| s.joined);
        matching.into_iter().map(|s| s.connection.clone()).collect()
    }

    /// Number of live sessions, registered or not.
    pub fn len(&self) -> usize {
        self.state.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of open sessions that have completed registration.
    pub fn registered_len(&self) -> usize {
        self.state.read().sessions.values().filter(|s| listed(s)).count()
    }
}

/// A session shows up in user lists once it is registered and until its
/// transport closes, even if the entry has not been removed yet.
fn listed(session: &Session) -> bool {
    session.is_registered() && session.connection.is_open()
}
