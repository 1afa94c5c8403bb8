//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::listing::CursorPolicy;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub url: String,
    pub language: String,
    pub timezone: String,

    // Content source
    pub api_endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: usize,

    // Rendering
    pub date_format: String,
    pub words_per_minute: usize,
    pub logo: String,

    // Generation
    pub public_dir: String,
    /// Seconds before a generated page is considered stale
    pub revalidate: u64,

    #[serde(default)]
    pub pagination: PaginationConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            url: "http://localhost:4000".to_string(),
            language: "pt-BR".to_string(),
            timezone: String::new(),

            api_endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 1,

            date_format: "PP".to_string(),
            words_per_minute: 200,
            logo: "/images/logo.svg".to_string(),

            public_dir: "public".to_string(),
            revalidate: 60 * 60 * 12,

            pagination: PaginationConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading {:?}", path.as_ref()))?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the configured timezone, falling back to UTC
    pub fn tz(&self) -> chrono_tz::Tz {
        if self.timezone.is_empty() {
            return chrono_tz::UTC;
        }
        match self.timezone.parse() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
                chrono_tz::UTC
            }
        }
    }

    /// Cursor handling for "load more"
    pub fn cursor_policy(&self) -> CursorPolicy {
        if self.pagination.follow_cursor {
            CursorPolicy::Follow
        } else {
            CursorPolicy::Exhaust
        }
    }
}

/// "Load more" behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Keep the upstream cursor after a load instead of treating the listing as exhausted
    pub follow_cursor: bool,
}
