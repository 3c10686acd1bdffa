//! The authenticated request pipeline.
//!
//! `RequestPipeline::perform` is a drop-in for a plain HTTP call: it attaches
//! the stored access token, and when the server answers 401 it runs one
//! coordinated refresh (shared with every other request that failed during
//! the same window) and replays the request with the new token. If the
//! refresh fails, the credentials are cleared and the refresh error is
//! returned instead of the 401.
//!
//! Replays after a shared refresh are sent one after another in the order
//! the requests queued; each waits for the previous replay's response.

use std::future::Future;
use std::sync::Arc;

use reqwest::{header, Client, Response, StatusCode};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::coordinator::{RefreshCoordinator, RefreshOutcome, ReplayTurn};
use super::{ApiError, ApiRequest};
use crate::auth::{AuthState, CredentialStore, Credentials, RefreshError, TokenPair, TokenRefresher};

pub struct RequestPipeline {
    http: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    coordinator: Arc<RefreshCoordinator>,
    auth_state: Arc<watch::Sender<AuthState>>,
}

impl RequestPipeline {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        let initial = store
            .read()
            .map(|c| AuthState::from_credentials(&c))
            .unwrap_or(AuthState::SignedOut);
        let (auth_state, _) = watch::channel(initial);

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            refresher,
            coordinator: Arc::new(RefreshCoordinator::new()),
            auth_state: Arc::new(auth_state),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> Result<Credentials, ApiError> {
        Ok(self.store.read()?)
    }

    /// Watch the signed-in status. Changes to `SessionExpired` when a refresh fails.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.auth_state.subscribe()
    }

    pub fn auth_state(&self) -> AuthState {
        *self.auth_state.borrow()
    }

    /// Callers currently waiting on an in-flight refresh (0 when idle).
    pub fn pending_refreshes(&self) -> usize {
        self.coordinator.pending()
    }

    /// Store a freshly issued token pair (login).
    pub fn sign_in(&self, tokens: &TokenPair) -> Result<(), ApiError> {
        let refresh_token = tokens
            .refresh_token
            .as_deref()
            .ok_or_else(|| ApiError::InvalidResponse("login response carried no refresh token".to_string()))?;
        self.store.write(&tokens.access_token, refresh_token)?;
        self.auth_state.send_replace(AuthState::SignedIn);
        info!("Signed in");
        Ok(())
    }

    /// Forget the credentials (logout).
    pub fn sign_out(&self) -> Result<(), ApiError> {
        self.store.clear()?;
        self.auth_state.send_replace(AuthState::SignedOut);
        info!("Signed out");
        Ok(())
    }

    /// Perform a request, transparently recovering from one expired access token.
    pub async fn perform(&self, mut request: ApiRequest) -> Result<Response, ApiError> {
        let mut token = if request.is_authenticated() {
            self.store.read()?.access_token
        } else {
            None
        };

        let mut turn: Option<ReplayTurn> = None;

        loop {
            if let Some(turn) = turn.as_mut() {
                turn.wait().await;
            }
            let dispatched = self.dispatch(&request, token.as_deref()).await;
            // The server has seen this replay; the next queued caller may send
            drop(turn.take());
            let response = dispatched?;

            if response.status() != StatusCode::UNAUTHORIZED
                || !request.is_authenticated()
                || request.is_retried()
            {
                return check_response(response).await;
            }

            request.mark_retried();
            warn!(method = %request.method(), path = request.path(), "Access token rejected, refreshing");
            let refreshed = self.coordinator.refreshed_token(self.refresh_cycle()).await?;
            token = Some(refreshed.token);
            turn = Some(refreshed.turn);
        }
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path());
        debug!(method = %request.method(), url = %url, retried = request.is_retried(), "Sending request");

        let mut builder = self
            .http
            .request(request.method().clone(), &url)
            .header(header::ACCEPT, "application/json");
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        Ok(builder.send().await?)
    }

    /// One refresh cycle: exchange the refresh token, then either store the
    /// new pair or clear everything. Runs detached from any single caller.
    fn refresh_cycle(&self) -> impl Future<Output = RefreshOutcome> + Send + 'static {
        let store = Arc::clone(&self.store);
        let refresher = Arc::clone(&self.refresher);
        let auth_state = Arc::clone(&self.auth_state);

        async move {
            let outcome = exchange_and_store(store.as_ref(), refresher.as_ref()).await;
            match &outcome {
                Ok(_) => {
                    info!("Access token refreshed");
                    auth_state.send_replace(AuthState::SignedIn);
                }
                Err(e) => {
                    warn!(error = %e, "Token refresh failed, clearing credentials");
                    if let Err(clear_err) = store.clear() {
                        error!(error = %clear_err, "Failed to clear credentials after refresh failure");
                    }
                    auth_state.send_replace(AuthState::SessionExpired);
                }
            }
            outcome
        }
    }
}

async fn exchange_and_store(
    store: &dyn CredentialStore,
    refresher: &dyn TokenRefresher,
) -> RefreshOutcome {
    let current = store
        .read()?
        .refresh_token
        .ok_or(RefreshError::MissingRefreshToken)?;

    let tokens = refresher.refresh(&current).await?;
    let refresh_token = tokens.refresh_token.unwrap_or(current);
    store.write(&tokens.access_token, &refresh_token)?;
    Ok(tokens.access_token)
}

/// Check if response is successful, returning an error with body if not.
async fn check_response(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }
}
