//! Local caching module for dashboard data.
//!
//! This module provides the `CacheManager` for storing data fetched from the
//! API as timestamped JSON files. Cached entries:
//! - Dashboard statistics (stale after a configurable number of minutes)
//! - Product categories (never stale; refreshed on demand)

pub mod manager;

pub use manager::{CacheManager, CachedData};
