//! Networking: the client's transport adapter
//!
//! This module provides:
//! - Length-prefixed JSON protocol for talking to the game server
//! - A TCP connection with non-blocking polling for the main loop
//!
//! It is the only part of the client that touches the wire format; everything
//! above it deals in typed messages.

pub mod connection;
pub mod protocol;

pub use connection::Connection;
pub use protocol::{ClientMessage, ServerMessage};
