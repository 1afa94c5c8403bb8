//! Post models projected from CMS documents

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::raw::RawDocument;
use super::richtext::RichTextBlock;
use crate::helpers::{parse_timestamp, Helpers};

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSummary {
    /// Unique identifier, also the route segment
    pub uid: String,

    /// Publication date already formatted for display
    pub first_publication_date: Option<String>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl ContentSummary {
    /// Project a raw document, formatting its date with the site's locale.
    ///
    /// Returns `None` for documents without a UID since they cannot be linked.
    pub fn from_raw(doc: &RawDocument, helpers: &Helpers) -> Option<Self> {
        let uid = doc.uid.clone().filter(|u| !u.is_empty())?;
        Some(Self {
            uid,
            first_publication_date: helpers.display_date(doc.first_publication_date.as_deref()),
            title: doc.data.title.as_string(),
            subtitle: doc.data.subtitle.as_string(),
            author: doc.data.author.as_string(),
        })
    }
}

/// A full post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDetail {
    pub uid: String,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Banner image URL
    pub banner: Option<String>,
    pub sections: Vec<Section>,
}

impl ContentDetail {
    /// Project a raw document. The UID falls back to `uid` when the document
    /// does not carry one.
    pub fn from_raw(doc: &RawDocument, uid: &str) -> Self {
        Self {
            uid: doc.uid.clone().unwrap_or_else(|| uid.to_string()),
            first_publication_date: doc
                .first_publication_date
                .as_deref()
                .and_then(parse_timestamp),
            title: doc.data.title.as_string(),
            subtitle: doc.data.subtitle.as_string(),
            author: doc.data.author.as_string(),
            banner: doc
                .data
                .banner
                .as_ref()
                .and_then(|b| b.url.clone())
                .filter(|u| !u.is_empty()),
            sections: doc
                .data
                .content
                .iter()
                .map(|s| Section {
                    heading: s.heading.as_string(),
                    body: s.body.clone(),
                })
                .collect(),
        }
    }
}

/// A headed group of rich-text blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

impl Section {
    /// Section with one paragraph per entry in `paragraphs`
    pub fn new(heading: &str, paragraphs: &[&str]) -> Self {
        Self {
            heading: heading.to_string(),
            body: paragraphs.iter().map(|p| RichTextBlock::paragraph(p)).collect(),
        }
    }
}
