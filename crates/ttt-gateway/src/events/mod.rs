//! Events the gateway reports upward

mod gateway_event;

pub use gateway_event::{DisconnectReason, GatewayEvent, InvitationPush, MatchPush};
