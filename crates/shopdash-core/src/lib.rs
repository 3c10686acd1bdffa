//! Core library for shopdash.
//!
//! Provides the authenticated API client for DummyJSON-style store APIs:
//!
//! - `api`: request pipeline with single-flight token refresh, typed services
//! - `auth`: credential storage and token refresh
//! - `cache`: local JSON cache for dashboard data
//! - `config`: persisted application configuration
//! - `models`: products, users, and dashboard statistics
//! - `utils`: display formatting helpers

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiRequest, RequestPipeline};
pub use auth::{AuthState, CredentialStore, Credentials, RefreshError, TokenPair};
pub use cache::CacheManager;
pub use config::Config;
