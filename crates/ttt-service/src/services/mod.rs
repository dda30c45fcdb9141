//! Coordinators and the client runtime
//!
//! The coordinators own their slice of state and send through a
//! `CommandSink`; `ClientContext` owns the coordinators, the connection and
//! the session, and `GameClient` drives the context from a single task.

pub mod client;
pub mod context;
pub mod error;
pub mod lobby;
pub mod matches;
pub mod notifications;

pub use client::{ClientHandle, ClientRequest, GameClient};
pub use context::{ClientContext, ClientContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use lobby::{LobbyCoordinator, LobbyPhase};
pub use matches::{ForfeitConfirmation, MatchCoordinator, MatchPhase, MatchUpdate};
pub use notifications::{ClientNotification, Notifier};
