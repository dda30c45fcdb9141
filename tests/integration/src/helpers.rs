//! Test helpers for integration tests
//!
//! `TestServer` runs a mock backend on a loopback port: the REST routes the
//! client calls, backed by an in-memory account table, and a `/ws` route
//! that hands every accepted socket to the test as a `ServerConn`. Tests
//! play the backend's side of the protocol through that handle.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use parking_lot::Mutex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use ttt_api::{AuthResponse, CurrentUser, GameHistoryEntry, HistoryResult, LeaderboardEntry, UserStats};
use ttt_common::{ClientConfig, TokenClaims};
use ttt_core::{GameId, Session, UserId};
use ttt_gateway::protocol::AuthenticatedPayload;
use ttt_gateway::{Command, GatewayMessage, Push};
use ttt_service::{ClientContext, ClientContextBuilder, ClientNotification};
use ttt_store::MemorySessionStore;

use crate::fixtures::{mint_token, LimitQuery, LoginBody, RegisterBody, JWT_SECRET};

/// How long a helper waits for the other side
pub const WAIT: Duration = Duration::from_secs(5);

type ApiReply<T> = Result<Json<T>, (StatusCode, Json<Value>)>;

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    username: String,
    password: String,
}

#[derive(Debug, Default)]
struct Accounts {
    next_id: i64,
    by_name: HashMap<String, Account>,
}

#[derive(Clone)]
struct MockState {
    accounts: Arc<Mutex<Accounts>>,
    connections: mpsc::UnboundedSender<ServerConn>,
}

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    accounts: Arc<Mutex<Accounts>>,
    connections: mpsc::UnboundedReceiver<ServerConn>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new mock backend
    pub async fn start() -> Result<Self> {
        let accounts = Arc::new(Mutex::new(Accounts {
            next_id: 1,
            by_name: HashMap::new(),
        }));
        let (conn_tx, connections) = mpsc::unbounded_channel();
        let state = MockState {
            accounts: accounts.clone(),
            connections: conn_tx,
        };

        let app = Router::new()
            .route("/health", get(health))
            .route("/api/register", post(register))
            .route("/api/login", post(login))
            .route("/api/users/me", get(current_user))
            .route("/api/stats/leaderboard", get(leaderboard))
            .route("/api/stats", get(my_stats))
            .route("/api/games/history", get(history))
            .route("/ws", get(ws_upgrade))
            .with_state(state);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            accounts,
            connections,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Client configuration pointing at this server
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.api.base_url = self.base_url();
        config.gateway.url = self.ws_url();
        config
    }

    /// Client context over the real WebSocket and REST clients
    pub fn client_context(
        &self,
        store: Arc<MemorySessionStore>,
    ) -> Result<(ClientContext, mpsc::Receiver<ClientNotification>)> {
        ClientContextBuilder::new()
            .config(self.client_config())
            .store(store)
            .build()
            .map_err(|e| anyhow!("failed to build client context: {e}"))
    }

    /// Create an account directly and return a session for it
    pub fn create_account(&self, username: &str, password: &str) -> Session {
        let account = insert_account(&self.accounts, username, password);
        let token = mint_token(account.id, &account.username, 3600);
        Session::new(account.id, account.username, token)
    }

    /// Wait for the next client connection
    pub async fn accept(&mut self) -> Result<ServerConn> {
        tokio::time::timeout(WAIT, self.connections.recv())
            .await
            .map_err(|_| anyhow!("timed out waiting for a client connection"))?
            .ok_or_else(|| anyhow!("server stopped"))
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }

    /// Make an authenticated GET request
    pub async fn get_auth(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).bearer_auth(token).send().await?)
    }
}

/// Assert response status
pub async fn assert_status(response: reqwest::Response, expected: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("expected status {expected}, got {status}: {body}"));
    }
    Ok(())
}

/// Assert response status and decode its JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: reqwest::Response,
    expected: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("expected status {expected}, got {status}: {body}"));
    }
    Ok(response.json().await?)
}

fn insert_account(accounts: &Mutex<Accounts>, username: &str, password: &str) -> Account {
    let mut accounts = accounts.lock();
    let id = UserId::new(accounts.next_id);
    accounts.next_id += 1;
    let account = Account {
        id,
        username: username.to_string(),
        password: password.to_string(),
    };
    accounts
        .by_name
        .insert(username.to_string(), account.clone());
    account
}

fn rejected(status: StatusCode, detail: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": detail })))
}

fn auth_response(account: &Account) -> AuthResponse {
    AuthResponse {
        access_token: mint_token(account.id, &account.username, 3600),
        token_type: "bearer".to_string(),
        user_id: account.id,
        username: account.username.clone(),
    }
}

fn bearer_account(state: &MockState, headers: &HeaderMap) -> Result<Account, (StatusCode, Json<Value>)> {
    let unauthorized = || rejected(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;
    let claims = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET),
        &Validation::default(),
    )
    .map_err(|_| unauthorized())?
    .claims;
    let user_id = claims.user_id().map_err(|_| unauthorized())?;

    state
        .accounts
        .lock()
        .by_name
        .values()
        .find(|a| a.id == user_id)
        .cloned()
        .ok_or_else(unauthorized)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "timestamp": Utc::now().to_rfc3339() }))
}

async fn register(State(state): State<MockState>, Json(body): Json<RegisterBody>) -> ApiReply<AuthResponse> {
    if state.accounts.lock().by_name.contains_key(&body.username) {
        return Err(rejected(StatusCode::BAD_REQUEST, "Username already registered"));
    }
    tracing::debug!(username = %body.username, email = ?body.email, "Mock register");
    let account = insert_account(&state.accounts, &body.username, &body.password);
    Ok(Json(auth_response(&account)))
}

async fn login(State(state): State<MockState>, Json(body): Json<LoginBody>) -> ApiReply<AuthResponse> {
    let account = state.accounts.lock().by_name.get(&body.username).cloned();
    match account {
        Some(account) if account.password == body.password => Ok(Json(auth_response(&account))),
        _ => Err(rejected(
            StatusCode::UNAUTHORIZED,
            "Incorrect username or password",
        )),
    }
}

async fn current_user(State(state): State<MockState>, headers: HeaderMap) -> ApiReply<CurrentUser> {
    let account = bearer_account(&state, &headers)?;
    Ok(Json(CurrentUser {
        id: account.id,
        username: account.username,
        email: None,
        is_online: true,
        created_at: Some(Utc::now().to_rfc3339()),
    }))
}

async fn leaderboard(
    State(state): State<MockState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<LeaderboardEntry>> {
    let limit = query.limit.unwrap_or(10) as usize;
    let mut names: Vec<String> = state.accounts.lock().by_name.keys().cloned().collect();
    names.sort();
    let entries = names
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, username)| LeaderboardEntry {
            rank: i as u32 + 1,
            username,
            wins: 0,
            losses: 0,
            draws: 0,
            win_rate: 0.0,
            ranking_points: 1000,
            best_streak: 0,
        })
        .collect();
    Json(entries)
}

async fn my_stats(State(state): State<MockState>, headers: HeaderMap) -> ApiReply<UserStats> {
    bearer_account(&state, &headers)?;
    Ok(Json(UserStats {
        total_games: 3,
        wins: 2,
        losses: 1,
        draws: 0,
        win_rate: 66.7,
        ranking_points: 1030,
        current_streak: 1,
        best_streak: 2,
    }))
}

async fn history(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<LimitQuery>,
) -> ApiReply<Vec<GameHistoryEntry>> {
    bearer_account(&state, &headers)?;
    let entries = vec![GameHistoryEntry {
        game_id: GameId::new(1),
        opponent: "Bot (easy)".to_string(),
        result: HistoryResult::Win,
        is_bot_game: true,
        finished_at: Some("2024-05-01T12:30:00".to_string()),
    }];
    Ok(Json(
        entries
            .into_iter()
            .take(query.limit.unwrap_or(20) as usize)
            .collect(),
    ))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<MockState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

enum ServerFrame {
    Text(String),
    Close,
}

async fn serve_socket(socket: WebSocket, state: MockState) {
    let (mut sink, mut stream) = socket.split();
    let (cmd_tx, commands) = mpsc::unbounded_channel();
    let (frame_tx, mut frames) = mpsc::unbounded_channel();

    if state
        .connections
        .send(ServerConn {
            commands,
            frames: frame_tx,
        })
        .is_err()
    {
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            match frame {
                ServerFrame::Text(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                ServerFrame::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                let decoded =
                    GatewayMessage::from_json(&text).and_then(|m| Command::from_message(&m));
                match decoded {
                    Ok(command) => {
                        if cmd_tx.send(command).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Mock backend got an undecodable frame"),
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    writer.abort();
}

/// Backend side of one client connection
pub struct ServerConn {
    commands: mpsc::UnboundedReceiver<Command>,
    frames: mpsc::UnboundedSender<ServerFrame>,
}

impl ServerConn {
    /// Next command from the client; `None` once it hung up
    pub async fn recv_command(&mut self) -> Result<Option<Command>> {
        tokio::time::timeout(WAIT, self.commands.recv())
            .await
            .map_err(|_| anyhow!("timed out waiting for a command"))
    }

    /// Next command, which must exist
    pub async fn expect_command(&mut self) -> Result<Command> {
        self.recv_command()
            .await?
            .ok_or_else(|| anyhow!("client closed the connection"))
    }

    /// Whether the client sends nothing for `quiet`
    pub async fn is_silent_for(&mut self, quiet: Duration) -> bool {
        match tokio::time::timeout(quiet, self.commands.recv()).await {
            Err(_) | Ok(None) => true,
            Ok(Some(command)) => {
                tracing::warn!(command = ?command, "Unexpected command");
                false
            }
        }
    }

    /// Whether the client has hung up
    pub async fn is_closed(&mut self) -> bool {
        matches!(
            tokio::time::timeout(WAIT, self.commands.recv()).await,
            Ok(None)
        )
    }

    pub fn push(&self, push: Push) -> Result<()> {
        let text = push.to_message()?.to_json()?;
        self.send_text(text)
    }

    /// Send an arbitrary text frame
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.frames
            .send(ServerFrame::Text(text.into()))
            .map_err(|_| anyhow!("connection already closed"))
    }

    /// Close the socket from the server side
    pub fn close(&self) {
        let _ = self.frames.send(ServerFrame::Close);
    }

    /// Expect `authenticate` and acknowledge it. Returns the token.
    pub async fn handshake(&mut self, user_id: UserId, username: &str) -> Result<String> {
        match self.expect_command().await? {
            Command::Authenticate { token } => {
                self.push(Push::Authenticated(AuthenticatedPayload {
                    user_id,
                    username: username.to_string(),
                }))?;
                Ok(token)
            }
            other => Err(anyhow!("expected authenticate, got {other:?}")),
        }
    }
}

/// Wait for the first notification matching `pred`, skipping the rest
pub async fn wait_for<F>(
    notifications: &mut mpsc::Receiver<ClientNotification>,
    mut pred: F,
) -> Result<ClientNotification>
where
    F: FnMut(&ClientNotification) -> bool,
{
    tokio::time::timeout(WAIT, async {
        while let Some(notification) = notifications.recv().await {
            if pred(&notification) {
                return Ok(notification);
            }
        }
        Err(anyhow!("notification channel closed"))
    })
    .await
    .map_err(|_| anyhow!("timed out waiting for notification"))?
}
