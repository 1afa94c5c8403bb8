//! Home page: the first page of the post listing

use serde::Serialize;

use super::StaticProps;
use crate::config::SiteConfig;
use crate::helpers::Helpers;
use crate::listing::PaginatedListing;
use crate::source::SourceSpec;

/// Data for the home page
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexProps {
    pub posts_pagination: PaginatedListing,
}

/// Load the first page of posts. Source failures yield an empty listing
/// with no "load more" cursor.
pub async fn index_props(spec: &SourceSpec, config: &SiteConfig) -> StaticProps<IndexProps> {
    let helpers = Helpers::new(config);

    let source = match spec.connect() {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!("Content source unavailable for listing: {}", e);
            return StaticProps::new(IndexProps::default(), config.revalidate);
        }
    };

    let posts_pagination = match source
        .list_by_type(&config.document_type, config.page_size)
        .await
    {
        Ok(page) => PaginatedListing::first(page, &helpers),
        Err(e) => {
            tracing::warn!(source = source.name(), "Failed to list posts: {}", e);
            PaginatedListing::default()
        }
    };

    tracing::debug!(
        "Listing has {} posts (more: {})",
        posts_pagination.results.len(),
        posts_pagination.has_more()
    );

    StaticProps::new(IndexProps { posts_pagination }, config.revalidate)
}
