//! End-to-end client flows over a real WebSocket
//!
//! The client runtime talks to the mock backend's `/ws` route; each test
//! plays the backend's side of the conversation through a `ServerConn`.
//!
//! Run with: cargo test -p integration-tests --test gateway_flow

use std::sync::Arc;
use std::time::Duration;

use integration_tests::{fixtures::*, wait_for, ServerConn, TestServer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use ttt_common::inspect_token;
use ttt_core::{
    BotDifficulty, GameId, InvitationId, OnlineUser, Outcome, Session, SessionStore, UserId,
};
use ttt_gateway::protocol::{
    ErrorPayload, GameJoinedPayload, InvitationReceivedPayload, OnlineUsersPayload,
};
use ttt_gateway::{Command, Push};
use ttt_service::{ClientContext, ClientHandle, ClientNotification, ClientRequest, GameClient};
use ttt_store::MemorySessionStore;

const PASSWORD: &str = "password123";

struct Client {
    handle: ClientHandle,
    notifications: mpsc::Receiver<ClientNotification>,
    runtime: JoinHandle<ClientContext>,
}

impl Client {
    async fn start(server: &TestServer, store: Arc<MemorySessionStore>, restore: bool) -> Self {
        let (mut ctx, notifications) = server
            .client_context(store)
            .expect("Failed to build client");
        if restore {
            assert!(ctx.restore().await.unwrap(), "expected a stored session");
        }
        let (client, handle) = GameClient::new(ctx, 32);
        Self {
            handle,
            notifications,
            runtime: tokio::spawn(client.run()),
        }
    }

    async fn send(&self, request: ClientRequest) {
        self.handle.send(request).await.expect("client runtime gone");
    }

    async fn wait_for<F>(&mut self, pred: F) -> ClientNotification
    where
        F: FnMut(&ClientNotification) -> bool,
    {
        wait_for(&mut self.notifications, pred)
            .await
            .expect("notification never arrived")
    }

    async fn shutdown(self) -> ClientContext {
        self.send(ClientRequest::Shutdown).await;
        self.runtime.await.expect("client runtime panicked")
    }
}

/// Log `session` in through the client and complete the handshake
async fn log_in(server: &mut TestServer, client: &mut Client, session: &Session) -> ServerConn {
    client
        .send(ClientRequest::Login {
            username: session.username.clone(),
            password: PASSWORD.to_string(),
        })
        .await;
    let mut conn = server.accept().await.expect("client never connected");
    let token = conn
        .handshake(session.user_id, &session.username)
        .await
        .expect("handshake failed");
    let claims = inspect_token(&token).unwrap();
    assert_eq!(claims.user_id().unwrap(), session.user_id);

    client
        .wait_for(|n| matches!(n, ClientNotification::SessionReady { resumed: false, .. }))
        .await;
    conn
}

async fn expect_join(conn: &mut ServerConn, game_id: GameId) {
    assert_eq!(
        conn.expect_command().await.unwrap(),
        Command::JoinGame { game_id }
    );
    conn.push(Push::GameJoined(GameJoinedPayload { game_id }))
        .unwrap();
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_login_and_handshake() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let session = server.create_account(&unique_username("hs"), PASSWORD);
    let store = Arc::new(MemorySessionStore::new());
    let mut client = Client::start(&server, store.clone(), false).await;

    let _conn = log_in(&mut server, &mut client, &session).await;

    let stored = store.load_session().await.unwrap().expect("session saved");
    assert_eq!(stored.user_id, session.user_id);

    // Lobby data is fetched once the session is ready
    client
        .wait_for(|n| matches!(n, ClientNotification::Stats(_)))
        .await;

    let ctx = client.shutdown().await;
    assert!(!ctx.connection_state().is_active());
}

#[tokio::test]
async fn test_auth_error_revokes_session() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let session = server.create_account(&unique_username("rev"), PASSWORD);
    let store = Arc::new(MemorySessionStore::new());
    let mut client = Client::start(&server, store.clone(), false).await;

    client
        .send(ClientRequest::Login {
            username: session.username.clone(),
            password: PASSWORD.to_string(),
        })
        .await;
    let mut conn = server.accept().await.unwrap();
    assert!(matches!(
        conn.expect_command().await.unwrap(),
        Command::Authenticate { .. }
    ));
    conn.push(Push::AuthError(ErrorPayload::new("Invalid token")))
        .unwrap();

    client
        .wait_for(|n| matches!(n, ClientNotification::SessionRevoked { .. }))
        .await;
    assert!(conn.is_closed().await);
    assert!(store.load_session().await.unwrap().is_none());

    client
        .send(ClientRequest::Invite(UserId::new(99)))
        .await;
    let failed = client
        .wait_for(|n| matches!(n, ClientNotification::RequestFailed { .. }))
        .await;
    if let ClientNotification::RequestFailed { code, .. } = failed {
        assert_eq!(code, "LOBBY_NOT_READY");
    }
}

#[tokio::test]
async fn test_reauthenticates_when_backend_forgets() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let session = server.create_account(&unique_username("reauth"), PASSWORD);
    let mut client = Client::start(&server, Arc::new(MemorySessionStore::new()), false).await;
    let mut conn = log_in(&mut server, &mut client, &session).await;

    conn.push(Push::Error(ErrorPayload::new("Not authenticated")))
        .unwrap();
    conn.handshake(session.user_id, &session.username)
        .await
        .expect("client did not re-authenticate");

    client
        .wait_for(|n| matches!(n, ClientNotification::SessionReady { resumed: true, .. }))
        .await;
}

// ============================================================================
// Lobby and Match Tests
// ============================================================================

#[tokio::test]
async fn test_invitation_to_defeat() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let session = server.create_account(&unique_username("inv"), PASSWORD);
    let rival = (UserId::new(900), "rival");
    let mut client = Client::start(&server, Arc::new(MemorySessionStore::new()), false).await;
    let mut conn = log_in(&mut server, &mut client, &session).await;

    conn.push(Push::OnlineUsers(OnlineUsersPayload {
        users: vec![
            OnlineUser::new(session.user_id, session.username.clone(), false),
            OnlineUser::new(rival.0, rival.1, false),
        ],
    }))
    .unwrap();
    let presence = client
        .wait_for(|n| matches!(n, ClientNotification::PresenceChanged(_)))
        .await;
    if let ClientNotification::PresenceChanged(users) = presence {
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, rival.0);
    }

    // The same sender invites twice; both are kept
    for id in [10, 11] {
        conn.push(Push::InvitationReceived(InvitationReceivedPayload {
            invitation_id: InvitationId::new(id),
            from_user_id: rival.0,
            from_username: rival.1.to_string(),
        }))
        .unwrap();
        client
            .wait_for(|n| matches!(n, ClientNotification::InvitationReceived(_)))
            .await;
    }
    client.send(ClientRequest::ListInvitations).await;
    let pending = client
        .wait_for(|n| matches!(n, ClientNotification::PendingInvitations(_)))
        .await;
    if let ClientNotification::PendingInvitations(list) = pending {
        assert_eq!(list.len(), 2);
    }

    client
        .send(ClientRequest::Reject(InvitationId::new(10)))
        .await;
    assert_eq!(
        conn.expect_command().await.unwrap(),
        Command::RejectInvitation {
            invitation_id: InvitationId::new(10)
        }
    );
    client
        .send(ClientRequest::Accept(InvitationId::new(11)))
        .await;
    assert_eq!(
        conn.expect_command().await.unwrap(),
        Command::AcceptInvitation {
            invitation_id: InvitationId::new(11)
        }
    );

    // Rival is X and moves first
    let game_id = GameId::new(77);
    conn.push(Push::GameStarted(human_match(
        game_id,
        rival,
        (session.user_id, session.username.as_str()),
    )))
    .unwrap();
    expect_join(&mut conn, game_id).await;
    client
        .wait_for(|n| matches!(n, ClientNotification::MatchJoined { .. }))
        .await;

    // Out of turn: refused locally
    client.send(ClientRequest::MakeMove(pos(4))).await;
    let failed = client
        .wait_for(|n| matches!(n, ClientNotification::RequestFailed { .. }))
        .await;
    if let ClientNotification::RequestFailed { code, .. } = failed {
        assert_eq!(code, "NOT_YOUR_TURN");
    }
    assert!(conn.is_silent_for(Duration::from_millis(200)).await);

    conn.push(Push::MoveMade(move_made(
        game_id,
        0,
        Some(rival.0),
        "X--------",
        Some(session.user_id),
    )))
    .unwrap();
    client
        .wait_for(|n| matches!(n, ClientNotification::BoardChanged(_)))
        .await;

    client.send(ClientRequest::MakeMove(pos(4))).await;
    assert_eq!(
        conn.expect_command().await.unwrap(),
        Command::MakeMove {
            game_id,
            position: pos(4)
        }
    );
    conn.push(Push::MoveMade(move_made(
        game_id,
        4,
        Some(session.user_id),
        "X---O----",
        Some(rival.0),
    )))
    .unwrap();
    conn.push(Push::MoveMade(move_made(
        game_id,
        1,
        Some(rival.0),
        "XX--O----",
        Some(session.user_id),
    )))
    .unwrap();
    client
        .wait_for(|n| match n {
            ClientNotification::BoardChanged(state) => state.board().to_string() == "XX--O----",
            _ => false,
        })
        .await;
    client.send(ClientRequest::MakeMove(pos(8))).await;
    assert_eq!(
        conn.expect_command().await.unwrap(),
        Command::MakeMove {
            game_id,
            position: pos(8)
        }
    );
    conn.push(Push::MoveMade(move_made(
        game_id,
        8,
        Some(session.user_id),
        "XX--O---O",
        Some(rival.0),
    )))
    .unwrap();
    conn.push(Push::MoveMade(winning_move(
        game_id,
        2,
        rival.0,
        "XXX-O---O",
        [0, 1, 2],
    )))
    .unwrap();

    let finished = client
        .wait_for(|n| matches!(n, ClientNotification::MatchFinished { .. }))
        .await;
    if let ClientNotification::MatchFinished { state, outcome } = finished {
        assert_eq!(outcome, Some(Outcome::Defeat));
        assert!(state.is_terminal());
        assert_eq!(state.board().to_string(), "XXX-O---O");
    }
}

#[tokio::test]
async fn test_bot_match_to_victory() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let session = server.create_account(&unique_username("bot"), PASSWORD);
    let me = session.user_id;
    let store = Arc::new(MemorySessionStore::new());
    let mut client = Client::start(&server, store.clone(), false).await;
    let mut conn = log_in(&mut server, &mut client, &session).await;

    client
        .send(ClientRequest::PlayVsBot(BotDifficulty::Hard))
        .await;
    assert_eq!(
        conn.expect_command().await.unwrap(),
        Command::PlayVsBot {
            difficulty: BotDifficulty::Hard
        }
    );

    let game_id = GameId::new(5);
    conn.push(Push::GameStarted(bot_match(
        game_id,
        (me, session.username.as_str()),
        BotDifficulty::Hard,
    )))
    .unwrap();
    expect_join(&mut conn, game_id).await;

    client.send(ClientRequest::MakeMove(pos(0))).await;
    conn.expect_command().await.unwrap();
    // The bot's turn has no owner
    conn.push(Push::MoveMade(move_made(game_id, 0, Some(me), "X--------", None)))
        .unwrap();
    conn.push(Push::MoveMade(move_made(game_id, 4, None, "X---O----", Some(me))))
        .unwrap();
    client
        .wait_for(|n| match n {
            ClientNotification::BoardChanged(state) => state.board().to_string() == "X---O----",
            _ => false,
        })
        .await;

    client.send(ClientRequest::MakeMove(pos(1))).await;
    conn.expect_command().await.unwrap();
    conn.push(Push::MoveMade(move_made(game_id, 1, Some(me), "XX--O----", None)))
        .unwrap();
    conn.push(Push::MoveMade(move_made(game_id, 8, None, "XX--O---O", Some(me))))
        .unwrap();

    client
        .wait_for(|n| match n {
            ClientNotification::BoardChanged(state) => state.board().to_string() == "XX--O---O",
            _ => false,
        })
        .await;
    client.send(ClientRequest::MakeMove(pos(2))).await;
    assert_eq!(
        conn.expect_command().await.unwrap(),
        Command::MakeMove {
            game_id,
            position: pos(2)
        }
    );
    conn.push(Push::MoveMade(winning_move(game_id, 2, me, "XXX-O---O", [0, 1, 2])))
        .unwrap();

    let finished = client
        .wait_for(|n| matches!(n, ClientNotification::MatchFinished { .. }))
        .await;
    if let ClientNotification::MatchFinished { outcome, .. } = finished {
        assert_eq!(outcome, Some(Outcome::Victory));
    }
    assert!(store.load_match().await.unwrap().is_some());

    client.send(ClientRequest::ReturnToLobby).await;
    client
        .wait_for(|n| matches!(n, ClientNotification::ReturnedToLobby))
        .await;
    assert!(store.load_match().await.unwrap().is_none());
}

// ============================================================================
// Recovery Tests
// ============================================================================

#[tokio::test]
async fn test_reconnect_rejoins_match() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let session = server.create_account(&unique_username("recon"), PASSWORD);
    let mut client = Client::start(&server, Arc::new(MemorySessionStore::new()), false).await;
    let mut conn = log_in(&mut server, &mut client, &session).await;

    let game_id = GameId::new(31);
    conn.push(Push::GameStarted(bot_match(
        game_id,
        (session.user_id, session.username.as_str()),
        BotDifficulty::Easy,
    )))
    .unwrap();
    expect_join(&mut conn, game_id).await;

    conn.close();
    client
        .wait_for(|n| matches!(n, ClientNotification::Disconnected { .. }))
        .await;

    client.send(ClientRequest::Connect).await;
    let mut conn = server.accept().await.unwrap();
    conn.handshake(session.user_id, &session.username)
        .await
        .unwrap();
    assert_eq!(
        conn.expect_command().await.unwrap(),
        Command::JoinGame { game_id }
    );
}

#[tokio::test]
async fn test_restart_resumes_stored_match() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let session = server.create_account(&unique_username("resume"), PASSWORD);
    let store = Arc::new(MemorySessionStore::new());

    let mut client = Client::start(&server, store.clone(), false).await;
    let mut conn = log_in(&mut server, &mut client, &session).await;
    let game_id = GameId::new(42);
    conn.push(Push::GameStarted(bot_match(
        game_id,
        (session.user_id, session.username.as_str()),
        BotDifficulty::Medium,
    )))
    .unwrap();
    expect_join(&mut conn, game_id).await;
    client.shutdown().await;

    // A fresh process over the same store picks the match back up
    let client = Client::start(&server, store.clone(), true).await;
    client.send(ClientRequest::Connect).await;
    let mut conn = server.accept().await.unwrap();
    conn.handshake(session.user_id, &session.username)
        .await
        .unwrap();
    assert_eq!(
        conn.expect_command().await.unwrap(),
        Command::JoinGame { game_id }
    );
}
