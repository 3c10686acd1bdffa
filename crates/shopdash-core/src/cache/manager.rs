use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::DashboardStats;

const DASHBOARD_STATS: &str = "dashboard_stats";
const CATEGORIES: &str = "categories";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew (negative ages)
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                // Round up: 1d 12h+ becomes 2d
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self, max_age_minutes: i64) -> bool {
        self.age_minutes() >= max_age_minutes
    }
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.cache_path(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache file: {}", name))?;
            debug!(name, "Cache entry removed");
        }
        Ok(())
    }

    // ===== Dashboard Stats =====

    pub fn load_dashboard_stats(&self) -> Result<Option<CachedData<DashboardStats>>> {
        self.load(DASHBOARD_STATS)
    }

    pub fn save_dashboard_stats(&self, stats: &DashboardStats) -> Result<()> {
        self.save(DASHBOARD_STATS, stats)
    }

    // ===== Categories =====

    pub fn load_categories(&self) -> Result<Option<CachedData<Vec<String>>>> {
        self.load(CATEGORIES)
    }

    pub fn save_categories(&self, categories: &[String]) -> Result<()> {
        self.save(CATEGORIES, &categories)
    }

    // ===== Invalidation =====

    /// Drop everything derived from the product catalog. Called after any
    /// product create/update/delete.
    pub fn invalidate_products(&self) -> Result<()> {
        self.remove(DASHBOARD_STATS)
    }

    /// Remove all cached entries (logout)
    pub fn clear(&self) -> Result<()> {
        for name in [DASHBOARD_STATS, CATEGORIES] {
            self.remove(name)?;
        }
        Ok(())
    }
}
