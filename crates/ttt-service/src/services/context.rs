//! Client context - the one owner of client state
//!
//! Holds the session, the connection, both coordinators and the ports they
//! need. Built once at startup, initialised on login and torn down on logout
//! or revocation. Every mutation happens through `&mut self`, so whoever
//! drives the context is its single writer.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use ttt_api::{ApiClient, ApiResult, LoginRequest, RegisterRequest};
use ttt_common::{inspect_token, AppError, ClientConfig};
use ttt_core::{
    BotDifficulty, DomainError, GameId, Invitation, InvitationId, MatchState, Position,
    Session, SessionStore, UserId,
};
use ttt_gateway::{
    ConnectionManager, ConnectionState, ConnectionStats, Connector, GatewayEvent,
    InvitationPush, MatchPush, TransportEvent, WsConnector,
};
use ttt_store::FileSessionStore;

use super::error::{ServiceError, ServiceResult};
use super::lobby::LobbyCoordinator;
use super::matches::{ForfeitConfirmation, MatchCoordinator, MatchUpdate};
use super::notifications::{ClientNotification, Notifier};

/// Client context
pub struct ClientContext {
    config: ClientConfig,
    store: Arc<dyn SessionStore>,
    api: Option<ApiClient>,
    connection: ConnectionManager,
    lobby: LobbyCoordinator,
    active_match: Option<MatchCoordinator>,
    session: Option<Session>,
    pending_forfeit: Option<ForfeitConfirmation>,
    notifier: Notifier,
}

impl ClientContext {
    // === Accessors ===

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        self.connection.stats()
    }

    pub fn lobby(&self) -> &LobbyCoordinator {
        &self.lobby
    }

    pub fn active_match(&self) -> Option<&MatchCoordinator> {
        self.active_match.as_ref()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // === Session lifecycle ===

    /// Restore a stored session and match snapshot.
    ///
    /// A stored token that is malformed, expired or issued to someone else
    /// is discarded along with everything stored for it.
    #[instrument(skip(self))]
    pub async fn restore(&mut self) -> ServiceResult<bool> {
        let Some(session) = self.store.load_session().await? else {
            debug!("No stored session");
            return Ok(false);
        };

        if let Err(e) = check_token(&session) {
            warn!(user_id = %session.user_id, error = %e, "Discarding stored session");
            self.store.clear_all().await?;
            return Ok(false);
        }

        if let Some(state) = self.store.load_match().await? {
            if state.slot_of(session.user_id).is_some() {
                info!(game_id = %state.game_id(), terminal = state.is_terminal(), "Restored match snapshot");
                self.active_match = Some(MatchCoordinator::new(session.user_id, state));
            } else {
                warn!(game_id = %state.game_id(), "Stored match does not involve this user; clearing");
                self.store.clear_match().await?;
            }
        }

        info!(user_id = %session.user_id, username = %session.username, "Session restored");
        self.notifier
            .notify(ClientNotification::LoggedIn {
                user_id: session.user_id,
                username: session.username.clone(),
            })
            .await;
        self.session = Some(session);
        Ok(true)
    }

    /// Log in over REST and store the resulting session
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, username: &str, password: &str) -> ServiceResult<()> {
        let response = self
            .api()?
            .login(&LoginRequest::new(username, password))
            .await?;
        self.establish_session(response.into_session()).await
    }

    /// Register over REST and store the resulting session
    #[instrument(skip(self, password))]
    pub async fn register(
        &mut self,
        username: &str,
        password: &str,
        email: Option<String>,
    ) -> ServiceResult<()> {
        let request = RegisterRequest::new(username, password).with_email(email);
        let response = self.api()?.register(&request).await?;
        self.establish_session(response.into_session()).await
    }

    /// Make `session` the active one.
    ///
    /// Switching users tears down the previous user's connection and state.
    pub async fn establish_session(&mut self, session: Session) -> ServiceResult<()> {
        if let Some(previous) = &self.session {
            if previous.user_id != session.user_id {
                info!(previous = %previous.user_id, "Switching user; dropping previous session");
                self.teardown();
                self.store.clear_all().await?;
            }
        }

        self.store.save_session(&session).await?;
        info!(user_id = %session.user_id, username = %session.username, "Logged in");
        self.notifier
            .notify(ClientNotification::LoggedIn {
                user_id: session.user_id,
                username: session.username.clone(),
            })
            .await;
        self.session = Some(session);
        Ok(())
    }

    /// Open the connection for the current session.
    ///
    /// Returns `false` when a connection is already active.
    #[instrument(skip(self))]
    pub async fn connect(&mut self) -> ServiceResult<bool> {
        let session = self.session.as_ref().ok_or(ServiceError::NotLoggedIn)?;

        if let Err(e) = check_token(session) {
            let reason = e.to_string();
            self.revoke_session(&reason).await;
            return Err(e.into());
        }

        let token = session.token.clone();
        if !self.connection.connect(&token).await? {
            return Ok(false);
        }
        self.lobby.on_connecting();
        self.notifier.notify(ClientNotification::Connecting).await;
        Ok(true)
    }

    /// Close the connection and keep the session
    pub async fn disconnect(&mut self) {
        if self.connection.disconnect() {
            self.lobby.on_disconnected();
            if let Some(m) = self.active_match.as_mut() {
                m.on_disconnected();
            }
            self.notifier
                .notify(ClientNotification::Disconnected {
                    reason: "disconnected by user".to_string(),
                })
                .await;
        }
    }

    /// Disconnect and forget the session and match
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> ServiceResult<()> {
        self.teardown();
        self.session = None;
        self.store.clear_all().await?;
        info!("Logged out");
        self.notifier.notify(ClientNotification::LoggedOut).await;
        Ok(())
    }

    async fn revoke_session(&mut self, reason: &str) {
        warn!(reason, "Session revoked");
        self.teardown();
        self.session = None;
        if let Err(e) = self.store.clear_all().await {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.notifier
            .notify(ClientNotification::SessionRevoked {
                reason: reason.to_string(),
            })
            .await;
    }

    fn teardown(&mut self) {
        self.connection.disconnect();
        self.lobby.reset();
        self.active_match = None;
        self.pending_forfeit = None;
    }

    // === Inbound ===

    /// Wait for the next frame or close from the connection
    pub async fn next_transport_event(&mut self) -> TransportEvent {
        self.connection.next_event().await
    }

    /// Route one transport event through the connection and coordinators
    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        if let Some(event) = self.connection.handle_transport_event(event) {
            self.handle_gateway_event(event).await;
        }
    }

    /// React to a demultiplexed gateway event
    pub async fn handle_gateway_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::SessionReady {
                user_id,
                username,
                reauthenticated,
            } => self.on_session_ready(user_id, username, reauthenticated).await,
            GatewayEvent::AuthRejected { reason } => self.revoke_session(&reason).await,
            GatewayEvent::ReauthRequested => {
                self.notifier.notify(ClientNotification::ReauthRequested).await;
            }
            GatewayEvent::Disconnected { reason } => {
                self.lobby.on_disconnected();
                if let Some(m) = self.active_match.as_mut() {
                    m.on_disconnected();
                }
                self.notifier
                    .notify(ClientNotification::Disconnected {
                        reason: reason.to_string(),
                    })
                    .await;
            }
            GatewayEvent::Presence(users) => {
                self.lobby.on_presence_push(users);
                self.notifier
                    .notify(ClientNotification::PresenceChanged(self.lobby.online_users()))
                    .await;
            }
            GatewayEvent::Invitation(push) => self.on_invitation_push(push).await,
            GatewayEvent::Match(push) => {
                if let Err(e) = self.on_match_push(push).await {
                    self.report(&e).await;
                }
            }
            GatewayEvent::ServerError { message } => {
                self.notifier
                    .notify(ClientNotification::ServerError { message })
                    .await;
            }
        }
    }

    async fn on_session_ready(&mut self, user_id: UserId, username: String, reauthenticated: bool) {
        if let Some(expected) = self.session.as_ref().map(|s| s.user_id) {
            if expected != user_id {
                let reason = format!("backend acknowledged user {user_id}, expected {expected}");
                self.revoke_session(&reason).await;
                return;
            }
        }

        self.lobby.on_session_ready(user_id);
        self.notifier
            .notify(ClientNotification::SessionReady {
                user_id,
                username,
                resumed: reauthenticated,
            })
            .await;

        // Initial join, or rejoin after a reconnect or re-authentication
        if let Some(m) = self.active_match.as_mut() {
            if let Err(e) = m.join(&mut self.connection) {
                self.report(&e).await;
            }
        }

        if !reauthenticated {
            self.refresh_lobby_data();
        }
    }

    async fn on_invitation_push(&mut self, push: InvitationPush) {
        match push {
            InvitationPush::Received(payload) => {
                let invitation = self.lobby.on_invitation_received(payload).clone();
                self.notifier
                    .notify(ClientNotification::InvitationReceived(invitation))
                    .await;
            }
            InvitationPush::Sent(payload) => {
                info!(to = %payload.to_username, "Invitation delivered");
                self.notifier
                    .notify(ClientNotification::InvitationSent {
                        to_username: payload.to_username,
                    })
                    .await;
            }
            InvitationPush::Rejected(payload) => {
                info!(invitation_id = %payload.invitation_id, "Invitation declined");
                self.notifier
                    .notify(ClientNotification::InvitationDeclined {
                        invitation_id: payload.invitation_id,
                    })
                    .await;
            }
        }
    }

    async fn on_match_push(&mut self, push: MatchPush) -> ServiceResult<()> {
        if let MatchPush::Started(payload) = &push {
            if let Some(current) = &self.active_match {
                if !current.is_terminal() {
                    if current.game_id() == payload.game_id {
                        debug!(game_id = %payload.game_id, "Repeated start for held match");
                        return Ok(());
                    }
                    warn!(
                        held = %current.game_id(),
                        started = %payload.game_id,
                        "New match started while another was live"
                    );
                }
            }

            let local_user = self.local_user()?;
            let state = self.lobby.on_match_start(payload)?;
            self.pending_forfeit = None;

            let coordinator = self
                .active_match
                .insert(MatchCoordinator::new(local_user, state.clone()));
            if self.connection.is_authenticated() {
                if let Err(e) = coordinator.join(&mut self.connection) {
                    self.report(&e).await;
                }
            }
            self.notifier
                .notify(ClientNotification::MatchStarted(state.clone()))
                .await;
            self.persist_match(&state).await;
            return Ok(());
        }

        let Some(coordinator) = self.active_match.as_mut() else {
            debug!(game_id = %push.game_id(), "Match push with no active match");
            return Ok(());
        };

        let update = match &push {
            MatchPush::Started(_) => MatchUpdate::Ignored,
            MatchPush::Joined(payload) => coordinator.on_joined(payload),
            MatchPush::MoveMade(payload) => coordinator.on_move_made(payload)?,
            MatchPush::Forfeited(payload) => coordinator.on_forfeited(payload)?,
        };

        match update {
            MatchUpdate::Ignored => {}
            MatchUpdate::Joined => {
                self.notifier
                    .notify(ClientNotification::MatchJoined {
                        game_id: coordinator.game_id(),
                    })
                    .await;
            }
            MatchUpdate::BoardChanged(_) => {
                let state = coordinator.state().clone();
                self.notifier
                    .notify(ClientNotification::BoardChanged(state.clone()))
                    .await;
                self.persist_match(&state).await;
            }
            MatchUpdate::Finished(outcome) => {
                let state = coordinator.state().clone();
                self.pending_forfeit = None;
                self.notifier
                    .notify(ClientNotification::MatchFinished {
                        state: state.clone(),
                        outcome,
                    })
                    .await;
                self.persist_match(&state).await;
                self.refresh_lobby_data();
            }
        }
        Ok(())
    }

    /// Store the latest snapshot. A failed write is reported, never fatal.
    async fn persist_match(&self, state: &MatchState) {
        if let Err(e) = self.store.save_match(state).await {
            warn!(game_id = %state.game_id(), error = %e, "Failed to save match snapshot");
            self.report(&ServiceError::from(e)).await;
        }
    }

    // === Lobby commands ===

    pub fn invite(&mut self, target_user_id: UserId) -> ServiceResult<()> {
        self.lobby.invite(&mut self.connection, target_user_id)
    }

    pub fn accept_invitation(&mut self, invitation_id: InvitationId) -> ServiceResult<Invitation> {
        self.lobby.accept(&mut self.connection, invitation_id)
    }

    pub fn reject_invitation(&mut self, invitation_id: InvitationId) -> ServiceResult<Invitation> {
        self.lobby.reject(&mut self.connection, invitation_id)
    }

    pub fn play_vs_bot(&mut self, difficulty: BotDifficulty) -> ServiceResult<()> {
        self.lobby.play_vs_bot(&mut self.connection, difficulty)
    }

    // === Match commands ===

    pub fn make_move(&mut self, position: Position) -> ServiceResult<()> {
        let coordinator = self
            .active_match
            .as_ref()
            .ok_or(DomainError::NoActiveMatch)?;
        coordinator.make_move(&mut self.connection, position)
    }

    /// First forfeit step; `confirm_forfeit` sends it
    pub async fn request_forfeit(&mut self) -> ServiceResult<GameId> {
        let coordinator = self
            .active_match
            .as_ref()
            .ok_or(DomainError::NoActiveMatch)?;
        let confirmation = coordinator.request_forfeit()?;
        let game_id = confirmation.game_id();
        self.pending_forfeit = Some(confirmation);
        self.notifier
            .notify(ClientNotification::ForfeitPending { game_id })
            .await;
        Ok(game_id)
    }

    pub fn confirm_forfeit(&mut self) -> ServiceResult<()> {
        let coordinator = self
            .active_match
            .as_ref()
            .ok_or(DomainError::NoActiveMatch)?;
        let confirmation = self
            .pending_forfeit
            .take()
            .ok_or_else(|| ServiceError::validation("no forfeit awaiting confirmation"))?;
        coordinator.forfeit(&mut self.connection, confirmation)
    }

    /// Drop a pending forfeit request. Returns whether one was pending.
    pub fn cancel_forfeit(&mut self) -> bool {
        self.pending_forfeit.take().is_some()
    }

    /// Leave a finished match and forget its snapshot
    pub async fn return_to_lobby(&mut self) -> ServiceResult<()> {
        let coordinator = self
            .active_match
            .as_ref()
            .ok_or(DomainError::NoActiveMatch)?;
        if !coordinator.is_terminal() {
            return Err(ServiceError::validation(
                "match still in progress; forfeit it first",
            ));
        }

        info!(game_id = %coordinator.game_id(), "Returning to lobby");
        self.active_match = None;
        self.pending_forfeit = None;
        self.store.clear_match().await?;
        self.notifier.notify(ClientNotification::ReturnedToLobby).await;
        Ok(())
    }

    // === REST reads ===

    /// Fetch the leaderboard in the background
    pub fn refresh_leaderboard(&self) -> ServiceResult<()> {
        let api = self.api()?.clone();
        let limit = self.config.client.leaderboard_limit;
        self.spawn_fetch(
            "leaderboard",
            async move { api.leaderboard(limit).await },
            ClientNotification::Leaderboard,
        );
        Ok(())
    }

    /// Fetch own statistics in the background
    pub fn refresh_stats(&self) -> ServiceResult<()> {
        let api = self.api()?.clone();
        let session = self.session.clone().ok_or(ServiceError::NotLoggedIn)?;
        self.spawn_fetch(
            "stats",
            async move { api.my_stats(&session).await },
            ClientNotification::Stats,
        );
        Ok(())
    }

    /// Fetch own game history in the background
    pub fn refresh_history(&self) -> ServiceResult<()> {
        let api = self.api()?.clone();
        let session = self.session.clone().ok_or(ServiceError::NotLoggedIn)?;
        let limit = self.config.client.history_limit;
        self.spawn_fetch(
            "history",
            async move { api.game_history(&session, limit).await },
            ClientNotification::History,
        );
        Ok(())
    }

    fn refresh_lobby_data(&self) {
        if self.api.is_none() {
            return;
        }
        for result in [self.refresh_leaderboard(), self.refresh_stats()] {
            if let Err(e) = result {
                debug!(error = %e, "Skipping background refresh");
            }
        }
    }

    fn spawn_fetch<T, F>(&self, what: &'static str, fetch: F, wrap: fn(T) -> ClientNotification)
    where
        T: Send + 'static,
        F: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let notification = match fetch.await {
                Ok(value) => wrap(value),
                Err(e) => {
                    warn!(what, error = %e, "Background fetch failed");
                    failure_notification(&ServiceError::from(e))
                }
            };
            notifier.notify(notification).await;
        });
    }

    // === Reporting ===

    /// Surface a failed operation to the presentation layer
    pub async fn report(&self, err: &ServiceError) {
        warn!(code = err.error_code(), category = %err.category(), error = %err, "Request failed");
        self.notifier.notify(failure_notification(err)).await;
    }

    fn api(&self) -> ServiceResult<&ApiClient> {
        self.api
            .as_ref()
            .ok_or_else(|| ServiceError::internal("REST client disabled"))
    }

    fn local_user(&self) -> ServiceResult<UserId> {
        self.session
            .as_ref()
            .map(|s| s.user_id)
            .ok_or(ServiceError::NotLoggedIn)
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("session", &self.session)
            .field("connection", &self.connection.state())
            .field("lobby", &self.lobby.phase())
            .field("match", &self.active_match.as_ref().map(|m| m.phase()))
            .field("rest", &self.api.is_some())
            .finish()
    }
}

fn failure_notification(err: &ServiceError) -> ClientNotification {
    ClientNotification::RequestFailed {
        code: err.error_code().to_string(),
        message: err.to_string(),
        category: err.category(),
    }
}

/// Reject tokens the backend would refuse anyway
fn check_token(session: &Session) -> Result<(), AppError> {
    let claims = inspect_token(&session.token)?;
    if claims.is_expired() {
        return Err(AppError::TokenExpired);
    }
    if claims.user_id()? != session.user_id {
        return Err(AppError::SessionRejected(
            "token subject does not match the stored user".to_string(),
        ));
    }
    Ok(())
}

/// Builder for creating ClientContext with custom configuration
pub struct ClientContextBuilder {
    config: Option<ClientConfig>,
    store: Option<Arc<dyn SessionStore>>,
    connector: Option<Arc<dyn Connector>>,
    api: Option<ApiClient>,
    rest_enabled: bool,
}

impl ClientContextBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
            connector: None,
            api: None,
            rest_enabled: true,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn api(mut self, api: ApiClient) -> Self {
        self.api = Some(api);
        self
    }

    /// Run without the REST client; login and stats become unavailable
    pub fn disable_rest(mut self) -> Self {
        self.rest_enabled = false;
        self
    }

    /// Build the ClientContext and the receiving end of its notifications
    ///
    /// Unset parts default to the file store, the WebSocket connector and a
    /// REST client built from the configuration.
    pub fn build(self) -> ServiceResult<(ClientContext, mpsc::Receiver<ClientNotification>)> {
        let config = self.config.unwrap_or_default();

        let store: Arc<dyn SessionStore> = match self.store {
            Some(store) => store,
            None => Arc::new(FileSessionStore::new(config.storage.dir.clone())),
        };
        let connector: Arc<dyn Connector> = match self.connector {
            Some(connector) => connector,
            None => Arc::new(WsConnector::new(config.client.event_buffer)),
        };
        let api = match (self.rest_enabled, self.api) {
            (false, _) => None,
            (true, Some(api)) => Some(api),
            (true, None) => Some(ApiClient::new(&config.api)?),
        };

        let (notifier, notifications) = Notifier::channel(config.client.event_buffer);
        let connection = ConnectionManager::new(config.gateway.url.clone(), connector);

        let context = ClientContext {
            config,
            store,
            api,
            connection,
            lobby: LobbyCoordinator::new(),
            active_match: None,
            session: None,
            pending_forfeit: None,
            notifier,
        };
        Ok((context, notifications))
    }
}

impl Default for ClientContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
