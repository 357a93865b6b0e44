//! Per-connection session state.

use relay_common::ConnectionId;

use super::connection::Connection;

/// State for a single live connection, owned by the registry.
pub struct Session {
    /// Identifier minted at accept time.
    pub id: ConnectionId,
    /// Display name, unset until the client registers.
    pub display_name: Option<String>,
    /// Outbound handle.
    pub connection: Connection,
    /// Accept order, used to keep the user list stable.
    pub(crate) joined: u64,
}

impl Session {
    pub fn new(id: ConnectionId, connection: Connection, joined: u64) -> Self {
        Self {
            id,
            display_name: None,
            connection,
            joined,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.display_name.is_some()
    }

    /// A detached copy safe to hand out of the registry lock.
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            connection: self.connection.clone(),
        }
    }
}

/// Read-only view of a session returned by registry lookups.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: ConnectionId,
    pub display_name: Option<String>,
    pub connection: Connection,
}
