//! Connection manager
//!
//! Owns the one persistent connection: performs the authenticate handshake,
//! retries it once when the backend loses the session, and demultiplexes
//! inbound pushes into [`GatewayEvent`]s. It interprets no game logic.

use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;

use crate::connection::{CommandSink, ConnectionState};
use crate::error::{GatewayError, GatewayResult};
use crate::events::{DisconnectReason, GatewayEvent, InvitationPush, MatchPush};
use crate::protocol::{AuthenticatedPayload, Command, ErrorPayload, GatewayMessage, Push};
use crate::transport::{Connector, TransportEvent, TransportHandle};

/// Counters for one manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub commands_sent: u64,
    pub pushes_received: u64,
    pub pushes_dropped: u64,
    pub reauth_attempts: u64,
}

/// Connection manager
pub struct ConnectionManager {
    url: String,
    connector: Arc<dyn Connector>,
    state: ConnectionState,
    token: Option<String>,
    transport: Option<TransportHandle>,
    /// A re-authenticate was sent and not yet acknowledged
    reauth_pending: bool,
    stats: ConnectionStats,
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        Self {
            url: url.into(),
            connector,
            state: ConnectionState::Disconnected,
            token: None,
            transport: None,
            reauth_pending: false,
            stats: ConnectionStats::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == ConnectionState::Authenticated
    }

    /// Open the connection and send the authenticate command.
    ///
    /// Returns `Ok(false)` without doing anything when a connection is
    /// already being opened or established.
    pub async fn connect(&mut self, token: &str) -> GatewayResult<bool> {
        if self.state.is_active() {
            tracing::debug!(state = %self.state, "Connect ignored; connection already active");
            return Ok(false);
        }

        self.set_state(ConnectionState::Connecting);
        self.token = Some(token.to_string());
        self.reauth_pending = false;

        let handle = match self.connector.open(&self.url).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "Connect failed");
                self.set_state(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        self.transport = Some(handle);
        self.set_state(ConnectionState::Connected);

        if let Err(e) = self.send_authenticate() {
            tracing::warn!(error = %e, "Failed to send authenticate");
            self.transport = None;
            self.set_state(ConnectionState::Disconnected);
            return Err(e);
        }
        Ok(true)
    }

    /// Close the transport after flushing queued frames. Returns whether
    /// anything changed.
    pub fn disconnect(&mut self) -> bool {
        let transport = self.transport.take();
        let had_transport = transport.is_some();
        if let Some(transport) = transport {
            transport.close();
        }
        if !had_transport && self.state == ConnectionState::Disconnected {
            return false;
        }
        self.reauth_pending = false;
        self.set_state(ConnectionState::Disconnected);
        tracing::info!("Disconnected");
        true
    }

    /// Wait for the next transport event.
    ///
    /// Pends forever while no transport is attached, so it can sit in a
    /// `select!` next to other sources. Cancel safe.
    pub async fn next_event(&mut self) -> TransportEvent {
        match self.transport.as_mut() {
            Some(transport) => transport.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Process a transport event
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> Option<GatewayEvent> {
        match event {
            TransportEvent::Message(message) => self.handle_message(&message),
            TransportEvent::Closed(reason) => self.handle_transport_closed(reason),
        }
    }

    /// Decode and route one inbound frame
    pub fn handle_message(&mut self, message: &GatewayMessage) -> Option<GatewayEvent> {
        if self.state == ConnectionState::AuthFailed {
            self.stats.pushes_dropped += 1;
            tracing::debug!(event = %message.event, "Dropping push after auth failure");
            return None;
        }

        let push = match Push::from_message(message) {
            Ok(push) => push,
            Err(e) => {
                self.stats.pushes_dropped += 1;
                tracing::warn!(event = %message.event, error = %e, "Dropping undecodable push");
                return None;
            }
        };

        self.stats.pushes_received += 1;
        tracing::debug!(event = %push.event_name(), state = %self.state, "Push received");
        self.handle_push(push)
    }

    /// The transport reported the connection gone
    pub fn handle_transport_closed(&mut self, reason: DisconnectReason) -> Option<GatewayEvent> {
        self.transport = None;
        match self.state {
            // Explicit teardown already reported
            ConnectionState::Disconnected | ConnectionState::AuthFailed => None,
            _ => {
                tracing::warn!(reason = %reason, state = %self.state, "Connection lost");
                self.reauth_pending = false;
                self.set_state(ConnectionState::Disconnected);
                Some(GatewayEvent::Disconnected { reason })
            }
        }
    }

    fn handle_push(&mut self, push: Push) -> Option<GatewayEvent> {
        match push {
            Push::Authenticated(payload) => self.on_authenticated(payload),
            Push::AuthError(payload) => Some(self.fail_auth(payload.message)),
            Push::Error(payload) => self.on_error(payload),
            Push::OnlineUsers(payload) => Some(GatewayEvent::Presence(payload.users)),
            Push::InvitationReceived(p) => {
                Some(GatewayEvent::Invitation(InvitationPush::Received(p)))
            }
            Push::InvitationSent(p) => Some(GatewayEvent::Invitation(InvitationPush::Sent(p))),
            Push::InvitationRejected(p) => {
                Some(GatewayEvent::Invitation(InvitationPush::Rejected(p)))
            }
            Push::GameStarted(p) => Some(GatewayEvent::Match(MatchPush::Started(p))),
            Push::GameJoined(p) => Some(GatewayEvent::Match(MatchPush::Joined(p))),
            Push::MoveMade(p) => Some(GatewayEvent::Match(MatchPush::MoveMade(p))),
            Push::GameForfeited(p) => Some(GatewayEvent::Match(MatchPush::Forfeited(p))),
        }
    }

    fn on_authenticated(&mut self, payload: AuthenticatedPayload) -> Option<GatewayEvent> {
        let reauthenticated = match self.state {
            ConnectionState::Connected => false,
            ConnectionState::Authenticated => true,
            state => {
                tracing::warn!(state = %state, "Unexpected authenticated acknowledgement");
                return None;
            }
        };

        self.reauth_pending = false;
        self.set_state(ConnectionState::Authenticated);
        tracing::info!(
            user_id = %payload.user_id,
            username = %payload.username,
            reauthenticated,
            "Session established"
        );
        Some(GatewayEvent::SessionReady {
            user_id: payload.user_id,
            username: payload.username,
            reauthenticated,
        })
    }

    fn on_error(&mut self, payload: ErrorPayload) -> Option<GatewayEvent> {
        match self.state {
            // The backend reports bad tokens as generic errors
            ConnectionState::Connected => Some(self.fail_auth(payload.message)),
            ConnectionState::Authenticated if payload.is_not_authenticated() => {
                if self.reauth_pending {
                    return Some(self.fail_auth(payload.message));
                }
                self.reauth_pending = true;
                self.stats.reauth_attempts += 1;
                tracing::warn!("Backend lost the session; re-authenticating");
                match self.send_authenticate() {
                    Ok(()) => Some(GatewayEvent::ReauthRequested),
                    Err(e) => Some(self.fail_auth(format!("re-authenticate not sent: {e}"))),
                }
            }
            _ => {
                tracing::debug!(message = %payload.message, "Server reported error");
                Some(GatewayEvent::ServerError {
                    message: payload.message,
                })
            }
        }
    }

    fn fail_auth(&mut self, reason: String) -> GatewayEvent {
        tracing::warn!(reason = %reason, "Authentication rejected");
        // Dropping the handle aborts the pump tasks and discards queued frames
        self.transport = None;
        self.token = None;
        self.reauth_pending = false;
        self.set_state(ConnectionState::AuthFailed);
        GatewayEvent::AuthRejected { reason }
    }

    fn send_authenticate(&mut self) -> GatewayResult<()> {
        let token = self.token.clone().ok_or(GatewayError::NotAuthenticated)?;
        self.send(Command::Authenticate { token })
    }

    fn send(&mut self, command: Command) -> GatewayResult<()> {
        let transport = self.transport.as_ref().ok_or(GatewayError::NotConnected)?;
        let message = command.to_message()?;
        transport.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => GatewayError::Backpressure,
            TrySendError::Closed(_) => GatewayError::ChannelClosed,
        })?;

        self.stats.commands_sent += 1;
        tracing::debug!(event = %command.event_name(), "Command sent");
        Ok(())
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "Connection state changed");
            self.state = next;
        }
    }
}

impl CommandSink for ConnectionManager {
    fn dispatch(&mut self, command: Command) -> GatewayResult<()> {
        match self.state {
            ConnectionState::AuthFailed => return Err(GatewayError::SessionRevoked),
            ConnectionState::Authenticated => {}
            ConnectionState::Connected if !command.requires_authentication() => {}
            ConnectionState::Disconnected => return Err(GatewayError::NotConnected),
            _ => return Err(GatewayError::NotAuthenticated),
        }
        self.send(command)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("url", &self.url)
            .field("state", &self.state)
            .field("reauth_pending", &self.reauth_pending)
            .field("stats", &self.stats)
            .finish()
    }
}
