//! Post listing and its "load more" pagination
//!
//! [`PaginatedListing::merge`] is a pure reducer: it takes the current
//! listing and a freshly fetched page and returns the next listing.
//! [`LoadMore`] drives it against a content source, one request at a time.

mod load_more;

pub use load_more::{LoadMore, LoadOutcome};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::content::ContentSummary;
use crate::helpers::Helpers;
use crate::source::{PageToken, RawPage};

/// What happens to the cursor after a page has been merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorPolicy {
    /// The listing is exhausted after one additional page
    #[default]
    Exhaust,
    /// Keep the cursor the source returned with the page
    Follow,
}

/// Posts loaded so far plus the cursor to the next page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginatedListing {
    /// `None` means there is nothing more to load
    pub next_page: Option<PageToken>,
    pub results: Vec<ContentSummary>,
}

impl PaginatedListing {
    /// Listing built from the first page; keeps the source's cursor
    pub fn first(page: RawPage, helpers: &Helpers) -> Self {
        let listing = Self {
            next_page: None,
            results: Vec::new(),
        };
        let next_page = page.next_page.clone();
        Self {
            next_page,
            ..listing.merge(page, helpers, CursorPolicy::Exhaust)
        }
    }

    /// Listing with no posts that resumes from `token`
    pub fn resume(token: PageToken) -> Self {
        Self {
            next_page: Some(token),
            results: Vec::new(),
        }
    }

    /// Whether a "load more" control should be offered
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Append a fetched page.
    ///
    /// Items are projected in delivery order. Items without a UID, or whose
    /// UID is already listed, are skipped so identifiers stay unique.
    pub fn merge(self, page: RawPage, helpers: &Helpers, policy: CursorPolicy) -> Self {
        let mut seen: HashSet<String> = self.results.iter().map(|s| s.uid.clone()).collect();
        let mut results = self.results;

        for doc in &page.results {
            match ContentSummary::from_raw(doc, helpers) {
                Some(summary) if seen.insert(summary.uid.clone()) => results.push(summary),
                Some(summary) => {
                    tracing::debug!("Skipping duplicate post {}", summary.uid);
                }
                None => tracing::debug!("Skipping document {:?} without uid", doc.id),
            }
        }

        let next_page = match policy {
            CursorPolicy::Exhaust => None,
            CursorPolicy::Follow => page.next_page,
        };

        Self { next_page, results }
    }
}
