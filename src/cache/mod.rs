//! Revalidation manifest
//!
//! Records when each route was generated and how long it stays fresh, so the
//! server can tell fresh pages from stale ones. A change to the site config
//! makes every route stale.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Cache directory name
pub const CACHE_DIR: &str = ".spacetraveling-cache";

/// Cache file name
const CACHE_FILE: &str = ".spacetraveling-cache/db.json";

/// A generated route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Generation time (unix seconds)
    pub generated_at: i64,
    /// Seconds the page stays fresh
    pub revalidate: u64,
    /// Output path relative to the public dir
    pub output_path: String,
}

/// Freshness of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Never generated
    Missing,
    Fresh,
    /// Generated, but past its revalidate interval
    Stale,
}

/// Manifest of generated routes
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    /// Hash of the site config (changes invalidate every route)
    pub config_hash: u64,
    /// Generated routes, keyed by route path
    pub routes: HashMap<String, RouteEntry>,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            if let Ok(cache) = serde_json::from_str::<CacheDb>(&content) {
                if cache.version == Self::VERSION {
                    return cache;
                }
                tracing::info!("Cache version mismatch, rebuilding cache");
            }
        }
        Self::new()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_dir = base_dir.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir)?;

        let cache_path = base_dir.join(CACHE_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_path, content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Record a freshly generated route
    pub fn record(&mut self, route: &str, output_path: &str, revalidate: u64, now: i64) {
        self.routes.insert(
            route.to_string(),
            RouteEntry {
                generated_at: now,
                revalidate,
                output_path: output_path.to_string(),
            },
        );
    }

    /// Forget a route
    pub fn remove(&mut self, route: &str) -> Option<RouteEntry> {
        self.routes.remove(route)
    }

    /// Mark every route stale and adopt a new config hash
    pub fn expire_all(&mut self, config_hash: u64) {
        for entry in self.routes.values_mut() {
            entry.generated_at = 0;
            entry.revalidate = 0;
        }
        self.config_hash = config_hash;
    }

    /// Freshness of a route at `now`, given the current config hash
    pub fn freshness(&self, route: &str, now: i64, config_hash: u64) -> Freshness {
        let Some(entry) = self.routes.get(route) else {
            return Freshness::Missing;
        };
        if self.config_hash != config_hash {
            return Freshness::Stale;
        }
        let age = now.saturating_sub(entry.generated_at);
        if age >= entry.revalidate as i64 {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }
}

/// Calculate a hash for content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Calculate hash for the site config file; 0 when there is none
pub fn hash_config(config_path: &Path) -> Result<u64> {
    if !config_path.exists() {
        return Ok(0);
    }
    let content = fs::read_to_string(config_path)?;
    Ok(hash_content(&content))
}
