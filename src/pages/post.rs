//! Post detail pages

use serde::Serialize;

use super::StaticProps;
use crate::config::SiteConfig;
use crate::content::ContentDetail;
use crate::helpers::is_valid_uid;
use crate::source::SourceSpec;

/// Why a post could not be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotFoundCause {
    /// The source does not know the UID
    Missing,
    /// The source could not be reached or answered with an error
    Unavailable,
}

/// Lifecycle of a post lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DetailState {
    /// Lookup still running; only a loading indicator can be rendered
    Pending,
    Resolved(Box<ContentDetail>),
    NotFound(NotFoundCause),
}

/// UIDs to pre-render. A source failure yields an empty set; those posts
/// are then generated on demand.
pub async fn static_paths(spec: &SourceSpec, config: &SiteConfig) -> Vec<String> {
    let source = match spec.connect() {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!("Content source unavailable for static paths: {}", e);
            return Vec::new();
        }
    };

    match source.list_all_uids(&config.document_type).await {
        Ok(uids) => uids
            .into_iter()
            .filter(|uid| {
                let valid = is_valid_uid(uid);
                if !valid {
                    tracing::warn!("Skipping post with unusable uid {:?}", uid);
                }
                valid
            })
            .collect(),
        Err(e) => {
            tracing::warn!(source = source.name(), "Failed to enumerate posts: {}", e);
            Vec::new()
        }
    }
}

/// Look up a single post
pub async fn post_props(
    spec: &SourceSpec,
    config: &SiteConfig,
    uid: &str,
) -> StaticProps<DetailState> {
    StaticProps::new(lookup(spec, config, uid).await, config.revalidate)
}

async fn lookup(spec: &SourceSpec, config: &SiteConfig, uid: &str) -> DetailState {
    if !is_valid_uid(uid) {
        return DetailState::NotFound(NotFoundCause::Missing);
    }

    let source = match spec.connect() {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!("Content source unavailable for {}: {}", uid, e);
            return DetailState::NotFound(NotFoundCause::Unavailable);
        }
    };

    match source.get_by_uid(&config.document_type, uid).await {
        Ok(doc) => DetailState::Resolved(Box::new(ContentDetail::from_raw(&doc, uid))),
        Err(e) if e.is_not_found() => {
            tracing::info!("Post not found: {}", uid);
            DetailState::NotFound(NotFoundCause::Missing)
        }
        Err(e) => {
            tracing::warn!(source = source.name(), "Failed to load post {}: {}", uid, e);
            DetailState::NotFound(NotFoundCause::Unavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::raw::{RawDocument, RawPostData, RawSection};
    use crate::content::{reading_time, RichTextBlock};
    use crate::source::MemorySource;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn spec() -> SourceSpec {
        let docs = vec![
            RawDocument {
                uid: Some("hooks".to_string()),
                data: RawPostData {
                    title: "Hooks".into(),
                    content: vec![
                        RawSection {
                            heading: "A".into(),
                            body: vec![RichTextBlock::paragraph("one two three")],
                        },
                        RawSection {
                            heading: "B".into(),
                            body: vec![RichTextBlock::paragraph("four")],
                        },
                    ],
                    ..Default::default()
                },
                ..Default::default()
            },
            RawDocument {
                uid: Some("Not A Slug".to_string()),
                ..Default::default()
            },
        ];
        SourceSpec::Memory(Arc::new(MemorySource::new(docs)))
    }

    #[tokio::test]
    async fn test_resolves_known_uid() {
        let props = post_props(&spec(), &SiteConfig::default(), "hooks").await;
        assert_eq!(props.revalidate, 43200);
        match props.props {
            DetailState::Resolved(detail) => {
                assert_eq!(detail.title, "Hooks");
                assert_eq!(reading_time(&detail.sections, 200), 1);
            }
            other => panic!("expected resolved, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_uid_is_not_found() {
        let props = post_props(&spec(), &SiteConfig::default(), "missing").await;
        assert_eq!(props.props, DetailState::NotFound(NotFoundCause::Missing));
    }

    #[tokio::test]
    async fn test_invalid_uid_is_not_looked_up() {
        let props = post_props(&spec(), &SiteConfig::default(), "../secret").await;
        assert_eq!(props.props, DetailState::NotFound(NotFoundCause::Missing));
    }

    #[tokio::test]
    async fn test_unreachable_source_is_unavailable() {
        let spec = SourceSpec::Fixture(PathBuf::from("/nonexistent/posts.json"));
        let props = post_props(&spec, &SiteConfig::default(), "hooks").await;
        assert_eq!(
            props.props,
            DetailState::NotFound(NotFoundCause::Unavailable)
        );
    }

    #[tokio::test]
    async fn test_static_paths_skip_unusable_uids() {
        let paths = static_paths(&spec(), &SiteConfig::default()).await;
        assert_eq!(paths, vec!["hooks".to_string()]);
    }
}
