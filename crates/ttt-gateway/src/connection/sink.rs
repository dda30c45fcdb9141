//! Outbound command seam
//!
//! Coordinators send through a `CommandSink` rather than the connection
//! itself, so their logic is exercised against a recording sink in tests.

use crate::error::GatewayResult;
use crate::protocol::Command;

/// Accepts outbound commands
pub trait CommandSink {
    /// Queue a command for the backend; fire-and-forget once accepted
    fn dispatch(&mut self, command: Command) -> GatewayResult<()>;
}

/// Records every command; used by tests and dry runs
impl CommandSink for Vec<Command> {
    fn dispatch(&mut self, command: Command) -> GatewayResult<()> {
        self.push(command);
        Ok(())
    }
}
