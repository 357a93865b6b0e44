pub mod clock;
pub mod id;

pub use id::{ConnectionId, PrefixedId};
