//! Fan-out of outbound messages to their recipient connections.
//!
//! A message is serialized once and the same frame is queued on every
//! recipient. Connections that are no longer open are skipped, and a failed
//! send never stops delivery to the remaining recipients.

use std::sync::Arc;

use super::connection::{Connection, SendOutcome};
use super::events::OutboundMessage;

/// One outbound message and the connections it is addressed to.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub recipients: Vec<Connection>,
    pub message: OutboundMessage,
}

impl Delivery {
    pub fn new(recipients: Vec<Connection>, message: OutboundMessage) -> Self {
        Self {
            recipients,
            message,
        }
    }

    /// A delivery addressed to a single connection.
    pub fn to(connection: Connection, message: OutboundMessage) -> Self {
        Self::new(vec![connection], message)
    }
}

/// Push every delivery, in order. Returns the number of frames queued.
pub fn deliver_all(deliveries: &[Delivery]) -> usize {
    deliveries.iter().map(deliver).sum()
}

/// Push one delivery to each of its recipients. Returns the number of
/// frames queued.
pub fn deliver(delivery: &Delivery) -> usize {
    let frame: Arc<str> = match serde_json::to_string(&delivery.message) {
        Ok(json) => Arc::from(json),
        Err(e) => {
            tracing::warn!(kind = delivery.message.kind(), error = %e, "failed to serialize outbound message");
            return 0;
        }
    };

    let mut queued = 0;
    for conn in &delivery.recipients {
        match conn.send(Arc::clone(&frame)) {
            SendOutcome::Queued => queued += 1,
            SendOutcome::Skipped => {}
            SendOutcome::Dropped => {
                tracing::debug!(
                    connection_id = %conn.id(),
                    kind = delivery.message.kind(),
                    "delivery dropped"
                );
            }
        }
    }

    tracing::trace!(
        kind = delivery.message.kind(),
        recipients = delivery.recipients.len(),
        queued,
        "delivered"
    );
    queued
}
