//! Command handlers for shopdash.
//!
//! `App` owns the configuration, the API client and the local cache, and
//! implements one method per CLI command.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use shopdash_core::api::ApiClient;
use shopdash_core::auth::{AuthState, CredentialStore, FileCredentialStore, KeyringCredentialStore};
use shopdash_core::cache::CacheManager;
use shopdash_core::config::{Config, CredentialBackend};
use shopdash_core::models::{ProductDraft, ProductFilters, ProductPatch, UserFilters};

use crate::output;

pub struct App {
    config: Config,
    client: ApiClient,
    cache: CacheManager,
}

/// Open the credential store selected in the config.
fn open_store(backend: CredentialBackend, cache_dir: &Path) -> Result<Arc<dyn CredentialStore>> {
    let store: Arc<dyn CredentialStore> = match backend {
        CredentialBackend::File => Arc::new(
            FileCredentialStore::open(cache_dir).context("Failed to open credential file")?,
        ),
        CredentialBackend::Keyring => {
            Arc::new(KeyringCredentialStore::open().context("Failed to open OS keychain")?)
        }
    };
    Ok(store)
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        debug!(?cache_dir, backend = ?config.credential_backend, "Cache directory configured");

        let store = open_store(config.credential_backend, &cache_dir)?;
        let client = ApiClient::from_config(&config, store)?;
        let cache = CacheManager::new(cache_dir)?;

        Ok(Self { config, client, cache })
    }

    fn require_login(&self) -> Result<()> {
        if !self.client.credentials()?.is_authenticated() {
            bail!("Not logged in. Run `shopdash login` first.");
        }
        Ok(())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, username: Option<String>) -> Result<()> {
        let username = match username {
            Some(username) => username,
            None => self.prompt_username()?,
        };
        let password = rpassword::prompt_password("Password: ")?;

        println!("Authenticating...");
        let user = self.client.login(&username, &password).await?;

        self.config.last_username = Some(user.username.clone());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
        // Stats may belong to a different account
        if let Err(e) = self.cache.clear() {
            warn!(error = %e, "Failed to clear cache");
        }

        println!("Logged in as {} ({})", user.full_name(), user.username);
        Ok(())
    }

    /// Prompt for a username, offering the last one used as the default.
    fn prompt_username(&self) -> Result<String> {
        match self.config.last_username {
            Some(ref last_user) => print!("Username [{}]: ", last_user),
            None => print!("Username: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        match (input.is_empty(), &self.config.last_username) {
            (true, Some(last_user)) => Ok(last_user.clone()),
            _ => Ok(input.to_string()),
        }
    }

    pub fn logout(&self) -> Result<()> {
        self.client.logout()?;
        self.cache.clear()?;
        info!("Logged out");
        println!("Logged out.");
        Ok(())
    }

    pub async fn whoami(&self) -> Result<()> {
        self.require_login()?;
        let user = self.client.current_user().await?;
        output::print_user(&user);
        Ok(())
    }

    pub fn status(&self) -> Result<()> {
        let state = AuthState::from_credentials(&self.client.credentials()?);
        println!("API:          {}", self.config.api_base_url);
        println!("Refresh URL:  {}", self.config.refresh_url());
        println!("Credentials:  {:?}", self.config.credential_backend);
        println!("Session:      {}", state.label());
        if let Some(ref username) = self.config.last_username {
            println!("Last user:    {}", username);
        }

        println!("Cache:        {}", self.cache.dir().display());
        match self.cache.load_dashboard_stats()? {
            Some(cached) => {
                let stale = if cached.is_stale(self.config.stats_stale_minutes) { " (stale)" } else { "" };
                println!("  stats       {}{}", cached.age_display(), stale);
            }
            None => println!("  stats       not cached"),
        }
        match self.cache.load_categories()? {
            Some(cached) => println!("  categories  {} ({} cached)", cached.age_display(), cached.data.len()),
            None => println!("  categories  not cached"),
        }
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn list_products(&self, filters: &ProductFilters) -> Result<()> {
        self.require_login()?;
        let page = self.client.fetch_products(filters).await?;
        output::print_products(&page);
        Ok(())
    }

    pub async fn show_product(&self, id: i64) -> Result<()> {
        self.require_login()?;
        let product = self.client.fetch_product(id).await?;
        output::print_product(&product);
        Ok(())
    }

    pub async fn categories(&self, refresh: bool) -> Result<()> {
        self.require_login()?;

        let cached = if refresh { None } else { self.load_cached_categories() };
        let categories = match cached {
            Some(categories) => categories,
            None => {
                let categories = self.client.fetch_categories().await?;
                if let Err(e) = self.cache.save_categories(&categories) {
                    warn!(error = %e, "Failed to cache categories");
                }
                categories
            }
        };

        output::print_categories(&categories);
        Ok(())
    }

    fn load_cached_categories(&self) -> Option<Vec<String>> {
        match self.cache.load_categories() {
            Ok(cached) => cached.map(|c| c.data),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable category cache");
                None
            }
        }
    }

    pub async fn add_product(&self, draft: &ProductDraft) -> Result<()> {
        self.require_login()?;
        let product = self.client.create_product(draft).await?;
        self.invalidate_products();
        println!("Created product {}.", product.id);
        output::print_product(&product);
        Ok(())
    }

    pub async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<()> {
        self.require_login()?;
        let product = self.client.update_product(id, patch).await?;
        self.invalidate_products();
        println!("Updated product {}.", product.id);
        output::print_product(&product);
        Ok(())
    }

    pub async fn delete_product(&self, id: i64) -> Result<()> {
        self.require_login()?;
        let product = self.client.delete_product(id).await?;
        self.invalidate_products();
        println!("Deleted product {} ({}).", product.id, product.title);
        Ok(())
    }

    fn invalidate_products(&self) {
        if let Err(e) = self.cache.invalidate_products() {
            warn!(error = %e, "Failed to invalidate cached statistics");
        }
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn list_users(&self, filters: &UserFilters) -> Result<()> {
        self.require_login()?;
        let page = self.client.fetch_users(filters).await?;
        output::print_users(&page);
        Ok(())
    }

    pub async fn show_user(&self, id: i64) -> Result<()> {
        self.require_login()?;
        let user = self.client.fetch_user(id).await?;
        output::print_user(&user);
        Ok(())
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    pub async fn stats(&self, refresh: bool, json: bool) -> Result<()> {
        self.require_login()?;

        let cached = if refresh {
            None
        } else {
            match self.cache.load_dashboard_stats() {
                Ok(cached) => cached.filter(|c| !c.is_stale(self.config.stats_stale_minutes)),
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable stats cache");
                    None
                }
            }
        };

        let (stats, age) = match cached {
            Some(cached) => {
                debug!(age_minutes = cached.age_minutes(), "Using cached dashboard stats");
                let age = cached.age_display();
                (cached.data, age)
            }
            None => {
                let stats = self.client.fetch_dashboard_stats().await?;
                if let Err(e) = self.cache.save_dashboard_stats(&stats) {
                    warn!(error = %e, "Failed to cache dashboard stats");
                }
                (stats, "just now".to_string())
            }
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            output::print_stats(&stats, &age);
        }
        Ok(())
    }
}
