//! # ttt-gateway
//!
//! The single persistent connection to the game backend.
//!
//! - [`protocol`]: JSON envelope, event names, typed commands and pushes
//! - [`connection`]: the `ConnectionManager` state machine and the
//!   `CommandSink` seam the coordinators send through
//! - [`events`]: what the manager reports upward after demultiplexing
//! - [`transport`]: WebSocket and in-memory connectors

pub mod connection;
pub mod error;
pub mod events;
pub mod protocol;
pub mod transport;

pub use connection::{CommandSink, ConnectionManager, ConnectionState, ConnectionStats};
pub use error::{GatewayError, GatewayResult, ProtocolError};
pub use events::{DisconnectReason, GatewayEvent, InvitationPush, MatchPush};
pub use protocol::{Command, EventName, GatewayMessage, Push, PushCategory};
pub use transport::{
    Connector, MemoryConnector, MemoryPeer, TransportEvent, TransportHandle, WsConnector,
};
