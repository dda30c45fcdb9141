//! Wire protocol
//!
//! Every frame is a JSON text message `{"event": <name>, "data": {...}}`.

mod commands;
mod event_names;
mod messages;
mod pushes;

pub use commands::Command;
pub use event_names::{EventName, PushCategory};
pub use messages::GatewayMessage;
pub use pushes::{
    AuthenticatedPayload, ErrorPayload, GameForfeitedPayload, GameJoinedPayload,
    GameStartedPayload, InvitationReceivedPayload, InvitationRejectedPayload,
    InvitationSentPayload, MoveMadePayload, OnlineUsersPayload, Push,
};
