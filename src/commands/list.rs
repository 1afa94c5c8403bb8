//! List posts the way the home page pages through them

use anyhow::Result;

use crate::helpers::Helpers;
use crate::listing::{LoadMore, LoadOutcome, PaginatedListing};
use crate::source::SourceSpec;
use crate::Site;

/// Fetch the first page of posts, then press "load more" up to `pages - 1`
/// times. Returns the final listing.
pub async fn run(site: &Site, spec: &SourceSpec, pages: usize) -> Result<PaginatedListing> {
    let config = &site.config;
    let helpers = Helpers::new(config);
    let source = spec.connect()?;

    let first = source
        .list_by_type(&config.document_type, config.page_size)
        .await?;
    let controller = LoadMore::new(
        source,
        PaginatedListing::first(first, &helpers),
        helpers,
        config.cursor_policy(),
    );

    for _ in 1..pages.max(1) {
        match controller.load_more().await? {
            LoadOutcome::Loaded { added } => tracing::debug!("Loaded {} more posts", added),
            LoadOutcome::Exhausted => break,
            other => tracing::debug!("load more: {:?}", other),
        }
    }

    let listing = controller.listing();
    println!("Posts ({}):", listing.results.len());
    for post in &listing.results {
        println!(
            "  {} - {} [{}]",
            post.first_publication_date.as_deref().unwrap_or("-"),
            post.title,
            post.uid
        );
    }
    if let Some(next) = &listing.next_page {
        println!("More posts available (next page: {})", next);
    }

    Ok(listing)
}
