use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Credentials file name in the cache directory
const CREDENTIALS_FILE: &str = "auth-storage.json";

/// Keychain service name
const SERVICE_NAME: &str = "shopdash";

/// Keychain account holding the JSON-encoded token pair
const SESSION_ACCOUNT: &str = "session";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed credentials file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// The access/refresh token pair for the signed-in user.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Both tokens present
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |t: &Option<String>| t.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// Durable home of the process-wide credentials.
///
/// `write` replaces both tokens together; `clear` removes both. Readers never
/// observe a half-updated pair.
pub trait CredentialStore: Send + Sync {
    fn read(&self) -> Result<Credentials, StoreError>;
    fn write(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<Credentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access_token: &str, refresh_token: &str) -> Self {
        Self {
            credentials: RwLock::new(Credentials::new(access_token, refresh_token)),
        }
    }

    /// Seed arbitrary (possibly partial) credentials.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: RwLock::new(credentials),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self) -> Result<Credentials, StoreError> {
        Ok(self.credentials.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn write(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError> {
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) =
            Credentials::new(access_token, refresh_token);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) = Credentials::default();
        Ok(())
    }
}

// ============================================================================
// File-backed store
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(flatten)]
    credentials: Credentials,
    #[serde(rename = "updatedAt")]
    updated_at: DateTime<Utc>,
}

/// Credentials persisted as JSON in the cache directory.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    credentials: RwLock<Credentials>,
}

impl FileCredentialStore {
    /// Open the store in `dir`, loading any previously saved credentials.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(CREDENTIALS_FILE);
        let credentials = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let stored: StoredCredentials = serde_json::from_str(&contents)?;
            debug!(updated_at = %stored.updated_at, "Loaded saved credentials");
            stored.credentials
        } else {
            Credentials::default()
        };

        Ok(Self {
            path,
            credentials: RwLock::new(credentials),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, credentials: &Credentials) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredCredentials {
            credentials: credentials.clone(),
            updated_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;

        // Write-then-rename so a crash never leaves a torn file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn read(&self) -> Result<Credentials, StoreError> {
        Ok(self.credentials.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn write(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError> {
        let mut guard = self.credentials.write().unwrap_or_else(PoisonError::into_inner);
        let updated = Credentials::new(access_token, refresh_token);
        self.persist(&updated)?;
        *guard = updated;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.credentials.write().unwrap_or_else(PoisonError::into_inner);
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        *guard = Credentials::default();
        Ok(())
    }
}

// ============================================================================
// OS keychain store
// ============================================================================

/// Credentials kept in the OS keychain as a single JSON entry, so both
/// tokens are replaced or removed by one keychain call.
pub struct KeyringCredentialStore {
    entry: Entry,
    credentials: RwLock<Credentials>,
}

impl KeyringCredentialStore {
    pub fn open() -> Result<Self, StoreError> {
        Self::with_entry(Entry::new(SERVICE_NAME, SESSION_ACCOUNT)?)
    }

    fn with_entry(entry: Entry) -> Result<Self, StoreError> {
        let credentials = match entry.get_password() {
            Ok(secret) => serde_json::from_str(&secret)?,
            Err(keyring::Error::NoEntry) => Credentials::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            entry,
            credentials: RwLock::new(credentials),
        })
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn read(&self) -> Result<Credentials, StoreError> {
        Ok(self.credentials.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn write(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError> {
        let mut guard = self.credentials.write().unwrap_or_else(PoisonError::into_inner);
        let updated = Credentials::new(access_token, refresh_token);
        self.entry.set_password(&serde_json::to_string(&updated)?)?;
        *guard = updated;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.credentials.write().unwrap_or_else(PoisonError::into_inner);
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(e.into()),
        }
        *guard = Credentials::default();
        Ok(())
    }
}
