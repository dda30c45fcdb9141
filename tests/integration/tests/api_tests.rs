//! REST client integration tests
//!
//! Every test starts its own mock backend on a loopback port, so no
//! external services are needed.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{assert_json, assert_status, fixtures::*, TestServer};
use reqwest::StatusCode;
use ttt_api::{ApiClient, ApiError, HealthStatus, HistoryResult, LoginRequest, RegisterRequest};
use ttt_common::inspect_token;
use ttt_core::Session;

fn api(server: &TestServer) -> ApiClient {
    ApiClient::new(&server.client_config().api).expect("Failed to build API client")
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    let health: HealthStatus = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(health.is_healthy());

    let health = api(&server).health().await.unwrap();
    assert!(health.is_healthy());
}

// ============================================================================
// Auth Tests
// ============================================================================

#[tokio::test]
async fn test_register_user() {
    let server = TestServer::start().await.expect("Failed to start server");
    let username = unique_username("reg");
    let request = RegisterRequest::new(&username, "password123")
        .with_email(Some("reg@example.com".to_string()));

    let auth = api(&server).register(&request).await.unwrap();
    assert_eq!(auth.username, username);
    assert_eq!(auth.token_type, "bearer");

    let claims = inspect_token(&auth.access_token).unwrap();
    assert_eq!(claims.user_id().unwrap(), auth.user_id);
    assert!(!claims.is_expired());
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let server = TestServer::start().await.expect("Failed to start server");
    let username = unique_username("dup");
    server.create_account(&username, "password123");

    let err = api(&server)
        .register(&RegisterRequest::new(&username, "password123"))
        .await
        .unwrap_err();
    match err {
        ApiError::Rejected { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "Username already registered");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_register_validated_locally() {
    let server = TestServer::start().await.expect("Failed to start server");
    let client = api(&server);

    let short = client
        .register(&RegisterRequest::new("ab", "password123"))
        .await
        .unwrap_err();
    assert!(matches!(short, ApiError::Validation(_)));

    let charset = client
        .register(&RegisterRequest::new("bad name!", "password123"))
        .await
        .unwrap_err();
    assert!(matches!(charset, ApiError::Validation(_)));

    let email = client
        .register(
            &RegisterRequest::new("valid_name", "password123")
                .with_email(Some("not-an-email".to_string())),
        )
        .await
        .unwrap_err();
    assert!(matches!(email, ApiError::Validation(_)));
}

#[tokio::test]
async fn test_login() {
    let server = TestServer::start().await.expect("Failed to start server");
    let username = unique_username("login");
    let created = server.create_account(&username, "secret99");

    let auth = api(&server)
        .login(&LoginRequest::new(&username, "secret99"))
        .await
        .unwrap();
    assert_eq!(auth.user_id, created.user_id);

    let session = auth.into_session();
    assert_eq!(session.username, username);
    assert!(!session.token.is_empty());
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let server = TestServer::start().await.expect("Failed to start server");
    let username = unique_username("wrong");
    server.create_account(&username, "secret99");

    let err = api(&server)
        .login(&LoginRequest::new(&username, "not-it"))
        .await
        .unwrap_err();
    match err {
        ApiError::InvalidCredentials(detail) => {
            assert_eq!(detail, "Incorrect username or password");
        }
        other => panic!("expected invalid credentials, got {other:?}"),
    }
}

#[tokio::test]
async fn test_login_requires_fields() {
    let server = TestServer::start().await.expect("Failed to start server");
    let err = api(&server)
        .login(&LoginRequest::new("", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

// ============================================================================
// User and Stats Tests
// ============================================================================

#[tokio::test]
async fn test_current_user() {
    let server = TestServer::start().await.expect("Failed to start server");
    let username = unique_username("me");
    let session = server.create_account(&username, "password123");

    let me = api(&server).current_user(&session).await.unwrap();
    assert_eq!(me.id, session.user_id);
    assert_eq!(me.username, username);
}

#[tokio::test]
async fn test_current_user_rejects_bad_token() {
    let server = TestServer::start().await.expect("Failed to start server");
    let session = server.create_account(&unique_username("bad"), "password123");
    let forged = Session::new(session.user_id, session.username.clone(), "not.a.jwt");

    let err = api(&server).current_user(&forged).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(err.status(), Some(401));

    let response = server.get("/api/users/me").await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_leaderboard_respects_limit() {
    let server = TestServer::start().await.expect("Failed to start server");
    for _ in 0..4 {
        server.create_account(&unique_username("lb"), "password123");
    }

    let entries = api(&server).leaderboard(3).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].rank, 1);
    assert_eq!(entries[2].rank, 3);
}

#[tokio::test]
async fn test_my_stats() {
    let server = TestServer::start().await.expect("Failed to start server");
    let session = server.create_account(&unique_username("stats"), "password123");

    let stats = api(&server).my_stats(&session).await.unwrap();
    assert_eq!(stats.total_games, 3);
    assert_eq!(stats.wins, 2);
    assert_eq!(stats.best_streak, 2);
}

#[tokio::test]
async fn test_game_history() {
    let server = TestServer::start().await.expect("Failed to start server");
    let session = server.create_account(&unique_username("hist"), "password123");

    let history = api(&server).game_history(&session, 20).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].result, HistoryResult::Win);
    assert!(history[0].is_bot_game);
    assert!(history[0].finished_at_naive().is_some());

    let response = server
        .get_auth("/api/games/history?limit=0", &session.token)
        .await
        .unwrap();
    let empty: Vec<serde_json::Value> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(empty.is_empty());
}
