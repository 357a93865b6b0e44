//! Session lifecycle: accept → pending registration → active → closed.
//!
//! The `Gateway` owns the registry. Each entry point holds the dispatch lock
//! across the registry operation *and* the queueing of its deliveries, so
//! the order in which clients see user lists always matches the order in
//! which the registry changed. Queueing never blocks, so the lock is never
//! held across an await point.

use parking_lot::Mutex;
use relay_common::ConnectionId;

use crate::error::RelayError;

use super::connection::Connection;
use super::events::OutboundMessage;
use super::fanout::{deliver_all, Delivery};
use super::handler::{route_frame, userlist_broadcast};
use super::registry::SessionRegistry;

pub struct Gateway {
    registry: SessionRegistry,
    dispatch: Mutex<()>,
    welcome_message: String,
}

impl Gateway {
    pub fn new(welcome_message: impl Into<String>) -> Self {
        Self {
            registry: SessionRegistry::new(),
            dispatch: Mutex::new(()),
            welcome_message: welcome_message.into(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Admit a freshly accepted connection as an unregistered session and
    /// greet it.
    ///
    /// If the id is already taken the new connection is closed and the
    /// existing session is left alone.
    pub fn accept(&self, connection: Connection) -> Result<(), RelayError> {
        let _guard = self.dispatch.lock();
        let id = connection.id().clone();

        if let Err(err) = self.registry.add(id.clone(), connection.clone()) {
            tracing::error!(connection_id = %id, error = %err, "rejecting connection");
            connection.close();
            return Err(err);
        }

        deliver_all(&[
            Delivery::to(
                connection.clone(),
                OutboundMessage::system(self.welcome_message.as_str()),
            ),
            Delivery::to(connection, OutboundMessage::RegisterPending {}),
        ]);

        tracing::info!(
            connection_id = %id,
            connections = self.registry.len(),
            "client connected"
        );
        Ok(())
    }

    /// Route one inbound text frame from `origin`.
    pub fn handle_frame(&self, origin: &ConnectionId, text: &str) {
        let _guard = self.dispatch.lock();
        let deliveries = route_frame(&self.registry, origin, text);
        deliver_all(&deliveries);
    }

    /// Tear down a session after its transport closed or failed.
    ///
    /// The connection handle is closed exactly once and the remaining
    /// registered clients receive a fresh user list. Calling this for an id
    /// that is already gone does nothing.
    pub fn disconnect(&self, id: &ConnectionId) {
        let _guard = self.dispatch.lock();
        let Some(session) = self.registry.remove(id) else {
            return;
        };
        session.connection.close();

        tracing::info!(
            connection_id = %id,
            username = session.display_name.as_deref().unwrap_or("-"),
            remaining = self.registry.len(),
            "client disconnected"
        );

        deliver_all(&[userlist_broadcast(&self.registry)]);
    }

    /// Ask every open connection to close. Each connection's task then runs
    /// the normal [`Gateway::disconnect`] path. Returns how many were open.
    pub fn close_all(&self) -> usize {
        let _guard = self.dispatch.lock();
        self.registry
            .open_connections()
            .iter()
            .filter(|c| c.close())
            .count()
    }
}
