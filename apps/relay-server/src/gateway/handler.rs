//! Inbound message routing: REGISTER, CHAT, PRIVATE, and everything else.
//!
//! Routing is pure with respect to the sockets: it reads and updates the
//! registry and returns the deliveries to make, leaving the actual sends to
//! `fanout`.

use relay_common::{clock, ConnectionId};

use crate::error::RelayError;

use super::connection::Connection;
use super::events::{InboundMessage, OutboundMessage};
use super::fanout::Delivery;
use super::registry::SessionRegistry;
use super::session::SessionInfo;

/// Longest display name kept, in characters.
pub const MAX_USERNAME_CHARS: usize = 50;

/// Longest chat or private message body kept, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Route a raw text frame. Parse failures are answered with an `error`
/// frame to the origin only.
pub fn route_frame(registry: &SessionRegistry, origin: &ConnectionId, text: &str) -> Vec<Delivery> {
    match InboundMessage::parse(text) {
        Ok(msg) => route(registry, origin, msg),
        Err(err) => {
            tracing::debug!(connection_id = %origin, error = %err, "rejected inbound frame");
            reject(registry, origin, &err)
        }
    }
}

/// Route a parsed message from `origin`.
///
/// Returns nothing if the origin is no longer in the registry (it closed
/// while the frame was in flight).
pub fn route(registry: &SessionRegistry, origin: &ConnectionId, msg: InboundMessage) -> Vec<Delivery> {
    let Some(sender) = registry.lookup(origin) else {
        return Vec::new();
    };
    let kind = msg.kind();

    let result = match msg {
        InboundMessage::Register { username } => handle_register(registry, &sender, username),
        InboundMessage::Chat { message } => handle_chat(registry, &sender, message),
        InboundMessage::Private { to_id, message } => {
            handle_private(registry, &sender, to_id, message)
        }
    };

    match result {
        Ok(deliveries) => deliveries,
        Err(err) if err.is_protocol() => {
            tracing::debug!(connection_id = %origin, kind, error = %err, "rejected inbound message");
            vec![Delivery::to(sender.connection, OutboundMessage::error(&err))]
        }
        Err(err) => {
            // The origin vanished between lookup and update.
            tracing::debug!(connection_id = %origin, kind, error = %err, "dropping inbound message");
            Vec::new()
        }
    }
}

/// The current user list, addressed to every registered connection.
pub fn userlist_broadcast(registry: &SessionRegistry) -> Delivery {
    Delivery::new(
        registry.registered_connections(),
        OutboundMessage::Userlist {
            users: registry.snapshot(),
        },
    )
}

fn reject(registry: &SessionRegistry, origin: &ConnectionId, err: &RelayError) -> Vec<Delivery> {
    registry
        .lookup(origin)
        .map(|s| vec![Delivery::to(s.connection, OutboundMessage::error(err))])
        .unwrap_or_default()
}

fn handle_register(
    registry: &SessionRegistry,
    sender: &SessionInfo,
    username: Option<String>,
) -> Result<Vec<Delivery>, RelayError> {
    let raw = username
        .filter(|u| !u.trim().is_empty())
        .ok_or(RelayError::UsernameRequired)?;
    let name = truncate_chars(&raw, MAX_USERNAME_CHARS).trim().to_string();
    if name.is_empty() {
        return Err(RelayError::UsernameRequired);
    }

    registry.set_username(&sender.id, name.clone())?;
    tracing::info!(connection_id = %sender.id, username = %name, "client registered");

    Ok(vec![
        Delivery::to(
            sender.connection.clone(),
            OutboundMessage::RegisterAck {
                client_id: sender.id.clone(),
                username: name,
            },
        ),
        userlist_broadcast(registry),
    ])
}

fn handle_chat(
    registry: &SessionRegistry,
    sender: &SessionInfo,
    message: Option<String>,
) -> Result<Vec<Delivery>, RelayError> {
    let username = sender
        .display_name
        .clone()
        .ok_or(RelayError::RegisterFirst)?;
    let Some(body) = non_empty(message) else {
        return Ok(Vec::new());
    };

    Ok(vec![Delivery::new(
        registry.open_connections(),
        OutboundMessage::Chat {
            username,
            client_id: sender.id.clone(),
            message: truncate_chars(&body, MAX_MESSAGE_CHARS).to_string(),
            timestamp: clock::now_timestamp(),
        },
    )])
}

fn handle_private(
    registry: &SessionRegistry,
    sender: &SessionInfo,
    to_id: Option<ConnectionId>,
    message: Option<String>,
) -> Result<Vec<Delivery>, RelayError> {
    let from_username = sender
        .display_name
        .clone()
        .ok_or(RelayError::RegisterFirst)?;
    let recipient = to_id
        .and_then(|id| registry.lookup(&id))
        .ok_or(RelayError::RecipientNotFound)?;
    let Some(body) = non_empty(message) else {
        return Ok(Vec::new());
    };

    let mut recipients: Vec<Connection> = vec![sender.connection.clone()];
    if recipient.id != sender.id {
        recipients.push(recipient.connection.clone());
    }

    Ok(vec![Delivery::new(
        recipients,
        OutboundMessage::Private {
            from_id: sender.id.clone(),
            from_username,
            to_id: recipient.id,
            to_username: recipient.display_name.unwrap_or_default(),
            message: truncate_chars(&body, MAX_MESSAGE_CHARS).to_string(),
            timestamp: clock::now_timestamp(),
        },
    )])
}

fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.is_empty())
}

/// The longest prefix of `s` holding at most `max` characters.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
