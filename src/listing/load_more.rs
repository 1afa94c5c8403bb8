//! Single-flight "load more" controller

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::{CursorPolicy, PaginatedListing};
use crate::helpers::Helpers;
use crate::source::{ContentSource, SourceError};

/// Result of a [`LoadMore::load_more`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and merged
    Loaded { added: usize },
    /// The listing has no cursor; nothing was fetched
    Exhausted,
    /// Another request is still outstanding; nothing was fetched
    Busy,
    /// The listing was cancelled while the request was outstanding; the
    /// page was discarded
    Cancelled,
}

/// Owns a listing and loads further pages into it, at most one request at a
/// time
pub struct LoadMore {
    source: Arc<dyn ContentSource>,
    helpers: Helpers,
    policy: CursorPolicy,
    listing: Mutex<PaginatedListing>,
    in_flight: AtomicBool,
    generation: AtomicU64,
}

/// Clears the in-flight flag however the request ends, including when the
/// future is dropped
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl LoadMore {
    pub fn new(
        source: Arc<dyn ContentSource>,
        listing: PaginatedListing,
        helpers: Helpers,
        policy: CursorPolicy,
    ) -> Self {
        Self {
            source,
            helpers,
            policy,
            listing: Mutex::new(listing),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the listing
    pub fn listing(&self) -> PaginatedListing {
        self.listing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the control should be shown and enabled
    pub fn can_load_more(&self) -> bool {
        !self.in_flight.load(Ordering::SeqCst) && self.listing().has_more()
    }

    /// Discard the result of any outstanding request
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Fetch the next page and merge it.
    ///
    /// Fetch failures are returned as errors and leave the listing unchanged.
    pub async fn load_more(&self) -> Result<LoadOutcome, SourceError> {
        let Some(token) = self.listing().next_page else {
            return Ok(LoadOutcome::Exhausted);
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("load more ignored: request already in flight");
            return Ok(LoadOutcome::Busy);
        }
        let _guard = InFlight(&self.in_flight);
        let generation = self.generation.load(Ordering::SeqCst);

        let page = match self.source.fetch_page(&token).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(source = self.source.name(), "load more failed: {}", e);
                return Err(e);
            }
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("load more result discarded after cancel");
            return Ok(LoadOutcome::Cancelled);
        }

        let mut listing = self.listing.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listing.results.len();
        let current = std::mem::take(&mut *listing);
        *listing = current.merge(page, &self.helpers, self.policy);
        let added = listing.results.len() - before;
        tracing::debug!("Loaded {} more posts", added);

        Ok(LoadOutcome::Loaded { added })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::raw::RawDocument;
    use crate::source::{MemorySource, PageToken, RawPage};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    fn docs(n: usize) -> Vec<RawDocument> {
        (1..=n)
            .map(|i| RawDocument {
                uid: Some(format!("post-{}", i)),
                ..Default::default()
            })
            .collect()
    }

    async fn controller(source: Arc<dyn ContentSource>, policy: CursorPolicy) -> LoadMore {
        let helpers = Helpers::new(&SiteConfig::default());
        let first = source.list_by_type("posts", 1).await.unwrap();
        let listing = PaginatedListing::first(first, &helpers);
        LoadMore::new(source, listing, helpers, policy)
    }

    /// Holds every page fetch until released
    struct GatedSource {
        inner: MemorySource,
        gate: Notify,
    }

    #[async_trait]
    impl ContentSource for GatedSource {
        async fn list_by_type(
            &self,
            type_tag: &str,
            page_size: usize,
        ) -> Result<RawPage, SourceError> {
            self.inner.list_by_type(type_tag, page_size).await
        }

        async fn fetch_page(&self, token: &PageToken) -> Result<RawPage, SourceError> {
            self.gate.notified().await;
            self.inner.fetch_page(token).await
        }

        async fn get_by_uid(&self, type_tag: &str, uid: &str) -> Result<RawDocument, SourceError> {
            self.inner.get_by_uid(type_tag, uid).await
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_one_extra_page_then_exhausted() {
        let source = Arc::new(MemorySource::new(docs(3)));
        let loader = controller(source.clone(), CursorPolicy::Exhaust).await;
        assert_eq!(loader.listing().results.len(), 1);
        assert!(loader.can_load_more());

        assert_eq!(
            loader.load_more().await.unwrap(),
            LoadOutcome::Loaded { added: 1 }
        );
        let listing = loader.listing();
        assert_eq!(listing.results.len(), 2);
        assert!(listing.next_page.is_none());
        assert!(!loader.can_load_more());

        let fetches = source.fetch_count();
        assert_eq!(loader.load_more().await.unwrap(), LoadOutcome::Exhausted);
        assert_eq!(source.fetch_count(), fetches);
        assert_eq!(loader.listing().results.len(), 2);
    }

    #[tokio::test]
    async fn test_follow_policy_walks_all_pages() {
        let source = Arc::new(MemorySource::new(docs(3)));
        let loader = controller(source, CursorPolicy::Follow).await;
        while loader.can_load_more() {
            loader.load_more().await.unwrap();
        }
        assert_eq!(loader.listing().results.len(), 3);
    }

    #[tokio::test]
    async fn test_second_request_while_in_flight_is_busy() {
        let source = Arc::new(GatedSource {
            inner: MemorySource::new(docs(2)),
            gate: Notify::new(),
        });
        let loader = Arc::new(controller(source.clone(), CursorPolicy::Exhaust).await);

        let pending = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load_more().await })
        };
        while loader.can_load_more() {
            tokio::task::yield_now().await;
        }

        assert_eq!(loader.load_more().await.unwrap(), LoadOutcome::Busy);

        source.gate.notify_one();
        assert_eq!(
            pending.await.unwrap().unwrap(),
            LoadOutcome::Loaded { added: 1 }
        );
        assert_eq!(loader.listing().results.len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_discards_outstanding_result() {
        let source = Arc::new(GatedSource {
            inner: MemorySource::new(docs(2)),
            gate: Notify::new(),
        });
        let loader = Arc::new(controller(source.clone(), CursorPolicy::Exhaust).await);

        let pending = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load_more().await })
        };
        while loader.can_load_more() {
            tokio::task::yield_now().await;
        }

        loader.cancel();
        source.gate.notify_one();
        assert_eq!(pending.await.unwrap().unwrap(), LoadOutcome::Cancelled);

        let listing = loader.listing();
        assert_eq!(listing.results.len(), 1);
        assert!(listing.next_page.is_some());
        assert!(loader.can_load_more());
    }

    #[tokio::test]
    async fn test_failure_leaves_listing_unchanged() {
        let source: Arc<dyn ContentSource> = Arc::new(MemorySource::new(docs(1)));
        let helpers = Helpers::new(&SiteConfig::default());
        let listing = PaginatedListing::resume(PageToken::new("garbage"));
        let loader = LoadMore::new(source, listing.clone(), helpers, CursorPolicy::Exhaust);

        assert!(loader.load_more().await.is_err());
        assert_eq!(loader.listing(), listing);
        assert!(loader.can_load_more());
    }
}
