//! Wire-format messages exchanged with relay clients.
//!
//! Every frame is a JSON object discriminated by its `type` field.

use relay_common::{clock, ConnectionId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::RelayError;

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// A message received from a client.
///
/// Payload fields that are missing or not JSON strings deserialize to
/// `None`; the router decides what absence means for each kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    Register {
        #[serde(default, deserialize_with = "lenient_string")]
        username: Option<String>,
    },
    Chat {
        #[serde(default, deserialize_with = "lenient_string")]
        message: Option<String>,
    },
    Private {
        #[serde(default, rename = "toId", deserialize_with = "lenient_id")]
        to_id: Option<ConnectionId>,
        #[serde(default, deserialize_with = "lenient_string")]
        message: Option<String>,
    },
}

impl InboundMessage {
    /// Parse a raw text frame.
    ///
    /// Text that is not JSON at all is [`RelayError::InvalidJson`]; any JSON
    /// value that does not carry a known `type` is
    /// [`RelayError::UnknownType`].
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        let value: Value = serde_json::from_str(text).map_err(|_| RelayError::InvalidJson)?;
        serde_json::from_value(value).map_err(|_| RelayError::UnknownType)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Chat { .. } => "chat",
            Self::Private { .. } => "private",
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<ConnectionId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.map(ConnectionId::from))
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// One row of the public user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub client_id: ConnectionId,
    pub username: String,
}

/// A message sent from the server to one or more clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    System {
        message: String,
        timestamp: String,
    },
    RegisterPending {},
    #[serde(rename_all = "camelCase")]
    RegisterAck {
        client_id: ConnectionId,
        username: String,
    },
    Userlist {
        users: Vec<UserEntry>,
    },
    #[serde(rename_all = "camelCase")]
    Chat {
        username: String,
        client_id: ConnectionId,
        message: String,
        timestamp: String,
    },
    #[serde(rename_all = "camelCase")]
    Private {
        from_id: ConnectionId,
        from_username: String,
        to_id: ConnectionId,
        to_username: String,
        message: String,
        timestamp: String,
    },
    Error {
        message: String,
    },
}

impl OutboundMessage {
    /// Build a `system` notice stamped with the current server time.
    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
            timestamp: clock::now_timestamp(),
        }
    }

    pub fn error(err: &RelayError) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::RegisterPending {} => "registerPending",
            Self::RegisterAck { .. } => "registerAck",
            Self::Userlist { .. } => "userlist",
            Self::Chat { .. } => "chat",
            Self::Private { .. } => "private",
            Self::Error { .. } => "error",
        }
    }
}
