//! TCP transport for the board view.
//!
//! Both directions speak newline-delimited JSON (see [`crate::protocol`]).
//! Network I/O lives entirely in `tokio` tasks; the update loop only sees the
//! queues of a [`SyncChannel`](crate::channel::SyncChannel).
//!
//! - `client` - Connects a session's channel to a server, reconnecting on loss
//! - `server` - Authoritative game state, applies commands and broadcasts snapshots

pub mod client;
pub mod server;

pub use client::run_client;
pub use server::{run_server, serve, ClientId, GameServer};
