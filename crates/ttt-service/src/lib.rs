//! # ttt-service
//!
//! Application layer of the client: the lobby and match coordinators, the
//! explicit client context that wires them to the connection, and the
//! runtime loop that drives everything from one task.

pub mod cli;
pub mod services;

pub use services::{
    ClientContext, ClientContextBuilder, ClientHandle, ClientNotification, ClientRequest,
    ForfeitConfirmation, GameClient, LobbyCoordinator, LobbyPhase, MatchCoordinator, MatchPhase,
    MatchUpdate, Notifier, ServiceError, ServiceResult,
};
