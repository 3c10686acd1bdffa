use futures::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::tokens::{TokenPair, TokenResponse};
use super::StoreError;
use crate::api::ApiError;

/// Why a refresh cycle failed.
///
/// Cloneable: one outcome is handed to every caller waiting on the cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Refresh rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Network error during refresh: {0}")]
    Network(String),

    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),

    #[error("Could not update credentials: {0}")]
    Store(String),

    #[error("Refresh task ended without a result")]
    Abandoned,
}

impl From<StoreError> for RefreshError {
    fn from(e: StoreError) -> Self {
        RefreshError::Store(e.to_string())
    }
}

/// Exchanges a refresh token for new tokens.
pub trait TokenRefresher: Send + Sync {
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, Result<TokenPair, RefreshError>>;
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
    #[serde(rename = "expiresInMins")]
    expires_in_mins: u32,
}

/// Refresher that calls the API's `/auth/refresh` endpoint.
///
/// Uses its own client so the refresh call never passes back through the
/// request pipeline.
#[derive(Clone)]
pub struct HttpTokenRefresher {
    client: Client,
    url: String,
    expires_in_mins: u32,
}

impl HttpTokenRefresher {
    pub fn new(client: Client, url: impl Into<String>, expires_in_mins: u32) -> Self {
        Self {
            client,
            url: url.into(),
            expires_in_mins,
        }
    }

    async fn exchange(&self, refresh_token: &str) -> Result<TokenPair, RefreshError> {
        debug!(url = %self.url, "Requesting token refresh");
        let response = self
            .client
            .post(&self.url)
            .json(&RefreshRequest {
                refresh_token,
                expires_in_mins: self.expires_in_mins,
            })
            .send()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message: ApiError::truncate_body(&body),
            });
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        tokens
            .into_pair()
            .ok_or_else(|| RefreshError::InvalidResponse("response carried no access token".to_string()))
    }
}

impl TokenRefresher for HttpTokenRefresher {
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, Result<TokenPair, RefreshError>> {
        Box::pin(self.exchange(refresh_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_refresher_posts_refresh_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/refresh")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "refreshToken": "R1",
                "expiresInMins": 30
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"accessToken":"T2","refreshToken":"R2"}"#)
            .create_async()
            .await;

        let refresher = HttpTokenRefresher::new(Client::new(), format!("{}/auth/refresh", server.url()), 30);
        let pair = refresher.refresh("R1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(pair.access_token, "T2");
        assert_eq!(pair.refresh_token.as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn test_http_refresher_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/refresh")
            .with_status(403)
            .with_body(r#"{"message":"Invalid refresh token"}"#)
            .create_async()
            .await;

        let refresher = HttpTokenRefresher::new(Client::new(), format!("{}/auth/refresh", server.url()), 30);
        let err = refresher.refresh("bad").await.unwrap_err();
        assert!(matches!(err, RefreshError::Rejected { status: 403, ref message } if message.contains("Invalid refresh token")));
    }

    #[tokio::test]
    async fn test_http_refresher_missing_access_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"refreshToken":"R2"}"#)
            .create_async()
            .await;

        let refresher = HttpTokenRefresher::new(Client::new(), format!("{}/auth/refresh", server.url()), 30);
        let err = refresher.refresh("R1").await.unwrap_err();
        assert!(matches!(err, RefreshError::InvalidResponse(_)));
    }
}
