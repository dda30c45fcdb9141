//! REST client

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use ttt_common::ApiConfig;
use ttt_core::Session;
use validator::Validate;

use crate::dto::{
    AuthResponse, CurrentUser, ErrorBody, GameHistoryEntry, HealthStatus, LeaderboardEntry,
    LoginRequest, RegisterRequest, UserStats,
};
use crate::error::{ApiError, ApiResult};

/// Client for the backend's REST endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from configuration
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("ttt-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(config.base_url.clone(), http))
    }

    /// Wrap an existing reqwest client
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /health`
    pub async fn health(&self) -> ApiResult<HealthStatus> {
        self.send(self.http.get(self.url("/health"))).await
    }

    /// `POST /api/login`
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        request.validate()?;
        tracing::debug!(username = %request.username, "Logging in");

        let result = self
            .send(self.http.post(self.url("/api/login")).json(request))
            .await;
        match result {
            Err(ApiError::Unauthorized(detail)) => Err(ApiError::InvalidCredentials(detail)),
            other => other,
        }
    }

    /// `POST /api/register`
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        request.validate()?;
        tracing::debug!(username = %request.username, "Registering");

        self.send(self.http.post(self.url("/api/register")).json(request))
            .await
    }

    /// `GET /api/users/me`
    pub async fn current_user(&self, session: &Session) -> ApiResult<CurrentUser> {
        self.send(
            self.http
                .get(self.url("/api/users/me"))
                .bearer_auth(&session.token),
        )
        .await
    }

    /// `GET /api/stats/leaderboard`
    pub async fn leaderboard(&self, limit: u32) -> ApiResult<Vec<LeaderboardEntry>> {
        self.send(
            self.http
                .get(self.url("/api/stats/leaderboard"))
                .query(&[("limit", limit)]),
        )
        .await
    }

    /// `GET /api/stats`
    pub async fn my_stats(&self, session: &Session) -> ApiResult<UserStats> {
        self.send(
            self.http
                .get(self.url("/api/stats"))
                .bearer_auth(&session.token),
        )
        .await
    }

    /// `GET /api/games/history`
    pub async fn game_history(
        &self,
        session: &Session,
        limit: u32,
    ) -> ApiResult<Vec<GameHistoryEntry>> {
        self.send(
            self.http
                .get(self.url("/api/games/history"))
                .bearer_auth(&session.token)
                .query(&[("limit", limit)]),
        )
        .await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message())
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        tracing::warn!(status = status.as_u16(), path = %url, detail = %detail, "Request rejected");

        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized(detail))
        } else {
            Err(ApiError::Rejected {
                status: status.as_u16(),
                detail,
            })
        }
    }
}
