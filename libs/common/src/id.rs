use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = relay_common::id::prefixed_ulid("conn");
/// assert!(id.starts_with("conn_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Marker trait for types that represent a prefixed ID.
pub trait PrefixedId: Sized {
    const PREFIX: &'static str;

    fn from_raw(raw: String) -> Self;

    fn generate() -> Self {
        Self::from_raw(prefixed_ulid(Self::PREFIX))
    }
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const CONNECTION: &str = "conn";
}

/// Opaque identifier minted for every accepted connection.
///
/// Serialized as a plain JSON string so clients can echo it back verbatim
/// (e.g. as the `toId` of a private message).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PrefixedId for ConnectionId {
    const PREFIX: &'static str = prefix::CONNECTION;

    fn from_raw(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
