//! Connection management

mod manager;
mod sink;
mod state;

pub use manager::{ConnectionManager, ConnectionStats};
pub use sink::CommandSink;
pub use state::ConnectionState;
