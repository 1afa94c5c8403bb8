//! Content source adapter
//!
//! The rest of the crate sees the CMS only through [`ContentSource`]. Pages
//! are addressed by opaque [`PageToken`]s that only the issuing source
//! interprets. Tokens never carry credentials: they end up in the listing
//! and the browser-facing API.

mod error;
mod memory;
mod prismic;

pub use error::SourceError;
pub use memory::MemorySource;
pub use prismic::PrismicSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::content::raw::RawDocument;

/// Page size used when enumerating every document of a type
pub const ENUMERATION_PAGE_SIZE: usize = 100;

/// Opaque handle to the next page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of raw documents
#[derive(Debug, Clone, Default)]
pub struct RawPage {
    pub results: Vec<RawDocument>,
    /// `None` when the source has no further pages
    pub next_page: Option<PageToken>,
}

/// Operations the site needs from a headless CMS
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// First page of documents of a type
    async fn list_by_type(&self, type_tag: &str, page_size: usize)
        -> Result<RawPage, SourceError>;

    /// The page a previous call pointed at
    async fn fetch_page(&self, token: &PageToken) -> Result<RawPage, SourceError>;

    /// A single document by UID
    async fn get_by_uid(&self, type_tag: &str, uid: &str) -> Result<RawDocument, SourceError>;

    /// Every UID of a type, across all pages. Stops at a cursor already
    /// followed or at an empty page.
    async fn list_all_uids(&self, type_tag: &str) -> Result<Vec<String>, SourceError> {
        let mut page = self.list_by_type(type_tag, ENUMERATION_PAGE_SIZE).await?;
        let mut uids = Vec::new();
        let mut seen = HashSet::new();
        loop {
            let found = page.results.len();
            uids.extend(page.results.into_iter().filter_map(|d| d.uid));
            match page.next_page {
                Some(token) if found > 0 && seen.insert(token.clone()) => {
                    page = self.fetch_page(&token).await?
                }
                Some(token) => {
                    tracing::warn!("{} pagination does not end at {}", self.name(), token);
                    break;
                }
                None => break,
            }
        }
        Ok(uids)
    }

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// How to build a content source. A fresh source is created for every
/// data-loading call.
#[derive(Clone)]
pub enum SourceSpec {
    /// Prismic REST API
    Prismic {
        endpoint: String,
        access_token: Option<String>,
    },
    /// JSON fixture file, re-read on every connect
    Fixture(PathBuf),
    /// Shared in-memory documents
    Memory(Arc<MemorySource>),
}

impl SourceSpec {
    /// Use the fixture if given, otherwise the configured API endpoint
    pub fn from_config(config: &SiteConfig, fixture: Option<PathBuf>) -> Self {
        match fixture {
            Some(path) => SourceSpec::Fixture(path),
            None => SourceSpec::Prismic {
                endpoint: config.api_endpoint.clone(),
                access_token: config.access_token.clone(),
            },
        }
    }

    /// Build a source
    pub fn connect(&self) -> Result<Arc<dyn ContentSource>, SourceError> {
        let source: Arc<dyn ContentSource> = match self {
            SourceSpec::Prismic {
                endpoint,
                access_token,
            } => Arc::new(PrismicSource::new(endpoint, access_token.clone())?),
            SourceSpec::Fixture(path) => Arc::new(MemorySource::from_file(path)?),
            SourceSpec::Memory(source) => source.clone(),
        };
        Ok(source)
    }
}

impl std::fmt::Debug for SourceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceSpec::Prismic { endpoint, .. } => write!(f, "Prismic({})", endpoint),
            SourceSpec::Fixture(path) => write!(f, "Fixture({:?})", path),
            SourceSpec::Memory(_) => write!(f, "Memory"),
        }
    }
}
