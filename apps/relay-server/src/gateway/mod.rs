//! Real-time relay gateway.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `connection` | Outbound handle for one client: bounded queue, open flag, close signal |
//! | `session` | Per-connection session state owned by the registry |
//! | `registry` | Connection id → session map, user list snapshots |
//! | `events` | Inbound/outbound wire messages |
//! | `handler` | Routing of register / chat / private messages |
//! | `fanout` | Serialize-once delivery to recipient sets |
//! | `lifecycle` | Accept / frame / disconnect orchestration |
//! | `server` | WebSocket upgrade and per-connection socket loop |

pub mod connection;
pub mod events;
pub mod fanout;
pub mod handler;
pub mod lifecycle;
pub mod registry;
pub mod server;
pub mod session;

pub use lifecycle::Gateway;
