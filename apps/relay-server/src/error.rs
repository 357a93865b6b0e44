use relay_common::ConnectionId;
use thiserror::Error;

/// Errors raised while accepting or routing relay traffic.
///
/// The protocol variants render exactly as the `message` of the `error`
/// frame sent back to the offending connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Invalid JSON format")]
    InvalidJson,

    #[error("Unknown message type")]
    UnknownType,

    #[error("Username required")]
    UsernameRequired,

    #[error("Register first")]
    RegisterFirst,

    #[error("Recipient not found")]
    RecipientNotFound,

    /// A freshly minted id is already in the registry.
    #[error("connection id {0} is already registered")]
    IdCollision(ConnectionId),

    #[error("connection {0} not found")]
    NotFound(ConnectionId),
}

impl RelayError {
    /// Whether this error is reported to the client as an `error` frame.
    pub fn is_protocol(&self) -> bool {
        !matches!(self, Self::IdCollision(_) | Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_render_client_messages() {
        assert_eq!(RelayError::InvalidJson.to_string(), "Invalid JSON format");
        assert_eq!(RelayError::UnknownType.to_string(), "Unknown message type");
        assert_eq!(RelayError::UsernameRequired.to_string(), "Username required");
        assert_eq!(RelayError::RegisterFirst.to_string(), "Register first");
        assert_eq!(RelayError::RecipientNotFound.to_string(), "Recipient not found");
    }

    #[test]
    fn internal_errors_are_not_protocol_errors() {
        let id = ConnectionId::from("conn_x");
        assert!(!RelayError::IdCollision(id.clone()).is_protocol());
        assert!(!RelayError::NotFound(id).is_protocol());
        assert!(RelayError::RegisterFirst.is_protocol());
    }
}
