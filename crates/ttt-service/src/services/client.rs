//! Client runtime
//!
//! `GameClient` owns the `ClientContext` and runs it on one task: inbound
//! transport events and user requests are interleaved by a single
//! `select!`, so state is never touched from two places at once.

use tokio::sync::mpsc;
use tracing::{debug, info};
use ttt_core::{BotDifficulty, InvitationId, Position, UserId};
use ttt_gateway::GatewayError;

use super::context::ClientContext;
use super::error::{ServiceError, ServiceResult};
use super::notifications::ClientNotification;

/// Something the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    Login {
        username: String,
        password: String,
    },
    Register {
        username: String,
        password: String,
        email: Option<String>,
    },
    Connect,
    Disconnect,
    ListUsers,
    ListInvitations,
    Invite(UserId),
    Accept(InvitationId),
    Reject(InvitationId),
    PlayVsBot(BotDifficulty),
    MakeMove(Position),
    Forfeit,
    ConfirmForfeit,
    CancelForfeit,
    ReturnToLobby,
    Leaderboard,
    Stats,
    History,
    Logout,
    Shutdown,
}

/// Sending half of the request channel
#[derive(Debug, Clone)]
pub struct ClientHandle {
    tx: mpsc::Sender<ClientRequest>,
}

impl ClientHandle {
    /// Queue a request for the runtime
    pub async fn send(&self, request: ClientRequest) -> ServiceResult<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| GatewayError::ChannelClosed.into())
    }

    /// Whether the runtime has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Single-task driver for a `ClientContext`
#[derive(Debug)]
pub struct GameClient {
    ctx: ClientContext,
    requests: mpsc::Receiver<ClientRequest>,
}

impl GameClient {
    pub fn new(ctx: ClientContext, buffer: usize) -> (Self, ClientHandle) {
        let (tx, requests) = mpsc::channel(buffer.max(1));
        (Self { ctx, requests }, ClientHandle { tx })
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    /// Run until `Shutdown` or every handle is dropped
    pub async fn run(mut self) -> ClientContext {
        info!("Client runtime started");
        loop {
            tokio::select! {
                event = self.ctx.next_transport_event() => {
                    self.ctx.handle_transport_event(event).await;
                }
                request = self.requests.recv() => {
                    let Some(request) = request else {
                        debug!("All client handles dropped");
                        break;
                    };
                    if request == ClientRequest::Shutdown {
                        break;
                    }
                    if let Err(e) = self.execute(request).await {
                        self.ctx.report(&e).await;
                    }
                }
            }
        }

        self.ctx.disconnect().await;
        info!("Client runtime stopped");
        self.ctx
    }

    /// Carry out one request against the context
    pub async fn execute(&mut self, request: ClientRequest) -> ServiceResult<()> {
        debug!(request = request_name(&request), "Executing request");
        let ctx = &mut self.ctx;
        match request {
            ClientRequest::Login { username, password } => {
                ctx.login(&username, &password).await?;
                ctx.connect().await?;
            }
            ClientRequest::Register {
                username,
                password,
                email,
            } => {
                ctx.register(&username, &password, email).await?;
                ctx.connect().await?;
            }
            ClientRequest::Connect => {
                ctx.connect().await?;
            }
            ClientRequest::Disconnect => ctx.disconnect().await,
            ClientRequest::ListUsers => {
                let users = ctx.lobby().online_users();
                ctx.notifier()
                    .notify(ClientNotification::PresenceChanged(users))
                    .await;
            }
            ClientRequest::ListInvitations => {
                let pending = ctx.lobby().pending_invitations().to_vec();
                ctx.notifier()
                    .notify(ClientNotification::PendingInvitations(pending))
                    .await;
            }
            ClientRequest::Invite(user_id) => ctx.invite(user_id)?,
            ClientRequest::Accept(invitation_id) => {
                ctx.accept_invitation(invitation_id)?;
            }
            ClientRequest::Reject(invitation_id) => {
                ctx.reject_invitation(invitation_id)?;
            }
            ClientRequest::PlayVsBot(difficulty) => ctx.play_vs_bot(difficulty)?,
            ClientRequest::MakeMove(position) => ctx.make_move(position)?,
            ClientRequest::Forfeit => {
                ctx.request_forfeit().await?;
            }
            ClientRequest::ConfirmForfeit => ctx.confirm_forfeit()?,
            ClientRequest::CancelForfeit => {
                if !ctx.cancel_forfeit() {
                    return Err(ServiceError::validation("no forfeit awaiting confirmation"));
                }
            }
            ClientRequest::ReturnToLobby => ctx.return_to_lobby().await?,
            ClientRequest::Leaderboard => ctx.refresh_leaderboard()?,
            ClientRequest::Stats => ctx.refresh_stats()?,
            ClientRequest::History => ctx.refresh_history()?,
            ClientRequest::Logout => ctx.logout().await?,
            ClientRequest::Shutdown => {}
        }
        Ok(())
    }
}

fn request_name(request: &ClientRequest) -> &'static str {
    match request {
        ClientRequest::Login { .. } => "login",
        ClientRequest::Register { .. } => "register",
        ClientRequest::Connect => "connect",
        ClientRequest::Disconnect => "disconnect",
        ClientRequest::ListUsers => "list_users",
        ClientRequest::ListInvitations => "list_invitations",
        ClientRequest::Invite(_) => "invite",
        ClientRequest::Accept(_) => "accept",
        ClientRequest::Reject(_) => "reject",
        ClientRequest::PlayVsBot(_) => "play_vs_bot",
        ClientRequest::MakeMove(_) => "make_move",
        ClientRequest::Forfeit => "forfeit",
        ClientRequest::ConfirmForfeit => "confirm_forfeit",
        ClientRequest::CancelForfeit => "cancel_forfeit",
        ClientRequest::ReturnToLobby => "return_to_lobby",
        ClientRequest::Leaderboard => "leaderboard",
        ClientRequest::Stats => "stats",
        ClientRequest::History => "history",
        ClientRequest::Logout => "logout",
        ClientRequest::Shutdown => "shutdown",
    }
}
