//! API client for the store REST API.
//!
//! `ApiClient` exposes typed auth, product, user and dashboard operations.
//! Every call goes through the `RequestPipeline`, so an expired access token
//! is refreshed and the call replayed without the caller noticing.

use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use super::{ApiError, ApiRequest, RequestPipeline};
use crate::auth::{
    AuthState, CredentialStore, Credentials, HttpTokenRefresher, LoginResponse, TokenRefresher,
};
use crate::config::Config;
use crate::models::{
    CategoryEntry, DashboardStats, FieldError, Product, ProductDraft, ProductFilters, ProductPatch,
    ProductsResponse, User, UserFilters, UsersResponse, ALL_CATEGORIES,
};

// ============================================================================
// Constants
// ============================================================================

/// Products sampled for dashboard statistics.
const STATS_PRODUCT_SAMPLE: u32 = 100;

/// Users fetched for dashboard statistics; only `total` is used.
const STATS_USER_SAMPLE: u32 = 30;

/// Characters escaped when a value is placed in a single URL path segment.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// API client for the store API.
/// Clone is cheap - the pipeline is shared behind an Arc.
#[derive(Clone)]
pub struct ApiClient {
    pipeline: Arc<RequestPipeline>,
    login_token_minutes: u32,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(rename = "expiresInMins")]
    expires_in_mins: u32,
}

impl ApiClient {
    /// Build a client for the configured API with the given credential store.
    pub fn from_config(config: &Config, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let refresher: Arc<dyn TokenRefresher> = Arc::new(HttpTokenRefresher::new(
            http.clone(), // Cheap clone, shares connection pool
            config.refresh_url(),
            config.refresh_token_minutes,
        ));

        let pipeline = RequestPipeline::new(http, config.api_base_url.clone(), store, refresher);
        Ok(Self::with_pipeline(Arc::new(pipeline)).with_login_token_minutes(config.login_token_minutes))
    }

    pub fn with_pipeline(pipeline: Arc<RequestPipeline>) -> Self {
        Self {
            pipeline,
            login_token_minutes: crate::config::DEFAULT_TOKEN_MINUTES,
        }
    }

    /// Lifetime requested for access tokens issued at login
    pub fn with_login_token_minutes(mut self, minutes: u32) -> Self {
        self.login_token_minutes = minutes;
        self
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    pub fn credentials(&self) -> Result<Credentials, ApiError> {
        self.pipeline.credentials()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.pipeline.subscribe()
    }

    async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path().to_string();
        let response = self.pipeline.perform(request).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e)))
    }

    // ===== Auth =====

    /// Log in and store the issued tokens. Returns the signed-in user.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        if username.trim().is_empty() {
            return Err(ApiError::Validation("Username is required".to_string()));
        }
        if password.is_empty() {
            return Err(ApiError::Validation("Password is required".to_string()));
        }

        let request = ApiRequest::post("/auth/login")
            .json(&LoginRequest {
                username: username.trim(),
                password,
                expires_in_mins: self.login_token_minutes,
            })?
            .without_auth();

        let login: LoginResponse = self.send(request).await?;
        let tokens = login
            .tokens
            .into_pair()
            .ok_or_else(|| ApiError::InvalidResponse("login response carried no access token".to_string()))?;
        self.pipeline.sign_in(&tokens)?;

        info!(username = %login.user.username, "Logged in");
        Ok(login.user)
    }

    /// The user the stored access token belongs to
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.send(ApiRequest::get("/auth/me")).await
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.pipeline.sign_out()
    }

    // ===== Products =====

    pub async fn fetch_products(&self, filters: &ProductFilters) -> Result<ProductsResponse, ApiError> {
        self.send(product_list_request(filters)).await
    }

    pub async fn fetch_product(&self, id: i64) -> Result<Product, ApiError> {
        self.send(ApiRequest::get(format!("/products/{}", id))).await
    }

    /// Category slugs, whichever shape the API lists them in
    pub async fn fetch_categories(&self) -> Result<Vec<String>, ApiError> {
        let entries: Vec<CategoryEntry> = self.send(ApiRequest::get("/products/categories")).await?;
        let categories: Vec<String> = entries.into_iter().filter_map(CategoryEntry::into_slug).collect();
        debug!(count = categories.len(), "Fetched categories");
        Ok(categories)
    }

    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        draft.validate().map_err(validation_error)?;
        self.send(ApiRequest::post("/products/add").json(draft)?).await
    }

    pub async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<Product, ApiError> {
        if patch.is_empty() {
            return Err(ApiError::Validation("Nothing to update".to_string()));
        }
        patch.validate().map_err(validation_error)?;
        self.send(ApiRequest::put(format!("/products/{}", id)).json(patch)?).await
    }

    pub async fn delete_product(&self, id: i64) -> Result<Product, ApiError> {
        self.send(ApiRequest::delete(format!("/products/{}", id))).await
    }

    // ===== Users =====

    pub async fn fetch_users(&self, filters: &UserFilters) -> Result<UsersResponse, ApiError> {
        self.send(user_list_request(filters)).await
    }

    pub async fn fetch_user(&self, id: i64) -> Result<User, ApiError> {
        self.send(ApiRequest::get(format!("/users/{}", id))).await
    }

    // ===== Dashboard =====

    /// Fetch the product and user samples concurrently and aggregate them
    pub async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        let products_request = ApiRequest::get("/products").query("limit", STATS_PRODUCT_SAMPLE);
        let users_request = ApiRequest::get("/users").query("limit", STATS_USER_SAMPLE);

        let (products, users): (ProductsResponse, UsersResponse) =
            futures::try_join!(self.send(products_request), self.send(users_request))?;

        Ok(DashboardStats::compute(&products, &users))
    }
}

fn validation_error(errors: Vec<FieldError>) -> ApiError {
    let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
    ApiError::Validation(joined.join("; "))
}

/// Map list filters onto the endpoint and query the API expects.
/// Search wins over category; `all` (or empty) means no category filter.
pub fn product_list_request(filters: &ProductFilters) -> ApiRequest {
    let search = filters.search.as_deref().filter(|s| !s.is_empty());
    let category = filters
        .category
        .as_deref()
        .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES);

    let mut request = match (search, category) {
        (Some(q), _) => ApiRequest::get("/products/search").query("q", q),
        (None, Some(category)) => ApiRequest::get(format!(
            "/products/category/{}",
            utf8_percent_encode(category, PATH_SEGMENT_ENCODE_SET)
        )),
        (None, None) => ApiRequest::get("/products"),
    };
    request = request.query("limit", filters.limit).query("skip", filters.skip);

    if let Some(sort_by) = filters.sort_by.as_deref().filter(|s| !s.is_empty()) {
        request = request
            .query("sortBy", sort_by)
            .query("order", filters.order.unwrap_or_default().as_str());
    }
    request
}

pub fn user_list_request(filters: &UserFilters) -> ApiRequest {
    let request = match filters.search.as_deref().filter(|s| !s.is_empty()) {
        Some(q) => ApiRequest::get("/users/search").query("q", q),
        None => ApiRequest::get("/users"),
    };
    request.query("limit", filters.limit).query("skip", filters.skip)
}
