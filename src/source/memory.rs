//! In-memory content source backed by a list of documents

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ContentSource, PageToken, RawPage, SourceError};
use crate::content::raw::{RawDocument, SearchResponse};

const TOKEN_PREFIX: &str = "memory";

/// Serves documents from memory, paginated like the remote API
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: Vec<RawDocument>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new(documents: Vec<RawDocument>) -> Self {
        Self {
            documents,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Load documents from a JSON file holding either an array of documents
    /// or a search response (`{"results": [...]}`)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let fixture_error = |message: String| SourceError::Fixture {
            path: path.to_path_buf(),
            message,
        };

        let content = fs::read_to_string(path).map_err(|e| fixture_error(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| fixture_error(e.to_string()))?;

        let documents = if value.is_array() {
            serde_json::from_value::<Vec<RawDocument>>(value)
        } else {
            serde_json::from_value::<SearchResponse>(value).map(|r| r.results)
        }
        .map_err(|e| fixture_error(e.to_string()))?;

        tracing::debug!("Loaded {} documents from {:?}", documents.len(), path);
        Ok(Self::new(documents))
    }

    /// Number of list/page/lookup calls served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// `None` when the page lies beyond what `usize` can address
    fn page(&self, type_tag: &str, page: usize, page_size: usize) -> Option<RawPage> {
        let page_size = page_size.max(1);
        let of_type: Vec<&RawDocument> = self
            .documents
            .iter()
            .filter(|d| d.doc_type.is_empty() || d.doc_type == type_tag)
            .collect();

        let start = (page - 1).checked_mul(page_size)?;
        let end = start.checked_add(page_size)?;
        let results = of_type
            .iter()
            .skip(start)
            .take(page_size)
            .map(|d| (*d).clone())
            .collect();

        let next_page = if end < of_type.len() {
            Some(PageToken::new(format!(
                "{}:{}:{}:{}",
                TOKEN_PREFIX,
                type_tag,
                page.checked_add(1)?,
                page_size
            )))
        } else {
            None
        };

        Some(RawPage { results, next_page })
    }
}

fn parse_token(token: &PageToken) -> Option<(&str, usize, usize)> {
    let mut parts = token.as_str().splitn(4, ':');
    if parts.next()? != TOKEN_PREFIX {
        return None;
    }
    let type_tag = parts.next()?;
    let page = parts.next()?.parse::<usize>().ok().filter(|p| *p >= 1)?;
    let size = parts.next()?.parse::<usize>().ok()?;
    Some((type_tag, page, size))
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn list_by_type(
        &self,
        type_tag: &str,
        page_size: usize,
    ) -> Result<RawPage, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.page(type_tag, 1, page_size)
            .ok_or_else(|| SourceError::InvalidToken(format!("page size {}", page_size)))
    }

    async fn fetch_page(&self, token: &PageToken) -> Result<RawPage, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        parse_token(token)
            .and_then(|(type_tag, page, size)| self.page(type_tag, page, size))
            .ok_or_else(|| SourceError::InvalidToken(token.to_string()))
    }

    async fn get_by_uid(&self, type_tag: &str, uid: &str) -> Result<RawDocument, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.documents
            .iter()
            .find(|d| {
                d.uid.as_deref() == Some(uid) && (d.doc_type.is_empty() || d.doc_type == type_tag)
            })
            .cloned()
            .ok_or_else(|| SourceError::not_found(type_tag, uid))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
