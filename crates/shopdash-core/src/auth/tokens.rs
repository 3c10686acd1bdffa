use serde::Deserialize;

use crate::models::User;

/// Normalized result of a login or refresh call.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    /// Absent when the endpoint did not rotate the refresh token.
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Token fields as the auth endpoints return them.
///
/// Depending on API version the access token arrives as `token` or
/// `accessToken`. `into_pair` is the only place that decides between them.
#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(rename = "accessToken", default)]
    access_token: Option<String>,
    #[serde(rename = "refreshToken", default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    /// Collapse the response into a `TokenPair`. `token` wins over
    /// `accessToken`; empty strings count as missing.
    pub fn into_pair(self) -> Option<TokenPair> {
        let non_empty = |t: Option<String>| t.filter(|s| !s.is_empty());
        let access_token = non_empty(self.token).or(non_empty(self.access_token))?;
        Some(TokenPair {
            access_token,
            refresh_token: non_empty(self.refresh_token),
        })
    }
}

/// `/auth/login` response: the user profile with tokens alongside.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenResponse,
}
