//! Authentication module for credentials and token refresh.
//!
//! This module provides:
//! - `CredentialStore`: durable access/refresh token storage (file, keychain, memory)
//! - `TokenRefresher`: exchanges a refresh token for new tokens
//! - `TokenResponse`: normalization of the auth endpoints' token fields
//! - `AuthState`: signed-in status published by the request pipeline

pub mod credentials;
pub mod refresh;
pub mod session;
pub mod tokens;

pub use credentials::{
    CredentialStore, Credentials, FileCredentialStore, KeyringCredentialStore, MemoryCredentialStore,
    StoreError,
};
pub use refresh::{HttpTokenRefresher, RefreshError, TokenRefresher};
pub use session::AuthState;
pub use tokens::{LoginResponse, TokenPair, TokenResponse};
