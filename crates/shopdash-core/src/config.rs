//! Application configuration management.
//!
//! Configuration is stored at `~/.config/shopdash/config.json` and can be
//! overridden per process with `SHOPDASH_*` environment variables (a `.env`
//! file is honored by the CLI).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "shopdash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "https://dummyjson.com";

/// Token lifetime requested from login and refresh calls
pub const DEFAULT_TOKEN_MINUTES: u32 = 30;

pub const ENV_API_BASE_URL: &str = "SHOPDASH_API_BASE_URL";
pub const ENV_REFRESH_URL: &str = "SHOPDASH_REFRESH_URL";
pub const ENV_CREDENTIAL_BACKEND: &str = "SHOPDASH_CREDENTIAL_BACKEND";

/// Where credentials are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// JSON file in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

impl std::str::FromStr for CredentialBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(CredentialBackend::File),
            "keyring" => Ok(CredentialBackend::Keyring),
            other => Err(format!("unknown credential backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// Defaults to `<api_base_url>/auth/refresh`
    pub refresh_url: Option<String>,
    pub credential_backend: CredentialBackend,
    pub request_timeout_secs: u64,
    pub login_token_minutes: u32,
    pub refresh_token_minutes: u32,
    pub stats_stale_minutes: i64,
    pub page_size: u32,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            refresh_url: None,
            credential_backend: CredentialBackend::default(),
            request_timeout_secs: 30,
            login_token_minutes: DEFAULT_TOKEN_MINUTES,
            refresh_token_minutes: DEFAULT_TOKEN_MINUTES,
            stats_stale_minutes: 5,
            page_size: 10,
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the user config directory and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `SHOPDASH_*` overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup(ENV_REFRESH_URL).filter(|v| !v.is_empty()) {
            self.refresh_url = Some(url);
        }
        if let Some(backend) = lookup(ENV_CREDENTIAL_BACKEND) {
            match backend.parse() {
                Ok(backend) => self.credential_backend = backend,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_CREDENTIAL_BACKEND),
            }
        }
    }

    pub fn refresh_url(&self) -> String {
        match self.refresh_url {
            Some(ref url) => url.clone(),
            None => format!("{}/auth/refresh", self.api_base_url.trim_end_matches('/')),
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "https://dummyjson.com");
        assert_eq!(config.refresh_url(), "https://dummyjson.com/auth/refresh");
        assert_eq!(config.credential_backend, CredentialBackend::File);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.refresh_token_minutes, 30);
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_refresh_url_follows_base_url() {
        let config = Config {
            api_base_url: "http://localhost:8080/".into(),
            ..Default::default()
        };
        assert_eq!(config.refresh_url(), "http://localhost:8080/auth/refresh");

        let explicit = Config {
            refresh_url: Some("https://auth.example.com/refresh".into()),
            ..Default::default()
        };
        assert_eq!(explicit.refresh_url(), "https://auth.example.com/refresh");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_BASE_URL, "http://127.0.0.1:9000"),
            (ENV_CREDENTIAL_BACKEND, "KEYRING"),
        ]);
        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.refresh_url(), "http://127.0.0.1:9000/auth/refresh");
        assert_eq!(config.credential_backend, CredentialBackend::Keyring);
    }

    #[test]
    fn test_bad_backend_override_ignored() {
        let mut config = Config::default();
        config.apply_env(|k| (k == ENV_CREDENTIAL_BACKEND).then(|| "vault".to_string()));
        assert_eq!(config.credential_backend, CredentialBackend::File);
    }

    #[test]
    fn test_save_and_load_round_trip_with_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        assert_eq!(Config::load_from(&path).unwrap().page_size, 10);

        let config = Config {
            last_username: Some("emilys".into()),
            page_size: 25,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.last_username.as_deref(), Some("emilys"));
        assert_eq!(loaded.page_size, 25);

        // Missing fields fall back to defaults
        std::fs::write(&path, r#"{"credential_backend":"keyring"}"#).unwrap();
        let partial = Config::load_from(&path).unwrap();
        assert_eq!(partial.credential_backend, CredentialBackend::Keyring);
        assert_eq!(partial.api_base_url, DEFAULT_API_BASE_URL);
    }
}
