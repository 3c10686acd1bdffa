/// Authentication status published by the request pipeline.
///
/// Front ends subscribe to this to notice a forced logout: a failed refresh
/// clears the credentials and moves the state to `SessionExpired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn,
    SessionExpired,
}

impl AuthState {
    pub fn from_credentials(credentials: &super::Credentials) -> Self {
        if credentials.is_authenticated() {
            AuthState::SignedIn
        } else {
            AuthState::SignedOut
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthState::SignedOut => "signed out",
            AuthState::SignedIn => "signed in",
            AuthState::SessionExpired => "session expired",
        }
    }
}
