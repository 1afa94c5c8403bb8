//! Wire shapes of CMS search responses
//!
//! Every document field is optional on the wire; anything missing or of the
//! wrong shape deserializes to an empty value instead of failing the page.

use serde::{Deserialize, Serialize};

use super::richtext::{lenient_vec, RichTextBlock};

/// One page of a document search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub page: u32,
    pub results_per_page: u32,
    pub total_results_size: u32,
    pub total_pages: u32,
    pub next_page: Option<String>,
    pub prev_page: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub results: Vec<RawDocument>,
}

/// A CMS document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDocument {
    pub id: String,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub first_publication_date: Option<String>,
    pub last_publication_date: Option<String>,
    pub data: RawPostData,
}

/// The `data` block of a post document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPostData {
    pub title: TextField,
    pub subtitle: TextField,
    pub author: TextField,
    pub banner: Option<RawImage>,
    #[serde(deserialize_with = "lenient_vec")]
    pub content: Vec<RawSection>,
}

/// An image field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawImage {
    pub url: Option<String>,
    pub alt: Option<String>,
}

/// A repeatable content group: heading plus rich-text body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSection {
    pub heading: TextField,
    #[serde(deserialize_with = "lenient_vec")]
    pub body: Vec<RichTextBlock>,
}

/// A text field that may be modelled as key text or as rich text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    Plain(String),
    Rich(Vec<RichTextBlock>),
    Other(serde_json::Value),
}

impl Default for TextField {
    fn default() -> Self {
        TextField::Plain(String::new())
    }
}

impl TextField {
    /// Flatten to a single line of text
    pub fn as_string(&self) -> String {
        match self {
            TextField::Plain(s) => s.clone(),
            TextField::Rich(blocks) => blocks
                .iter()
                .map(RichTextBlock::text)
                .collect::<Vec<_>>()
                .join(" "),
            TextField::Other(_) => String::new(),
        }
    }
}

impl From<&str> for TextField {
    fn from(s: &str) -> Self {
        TextField::Plain(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let json = r#"{
            "id": "YGY", "uid": "como-utilizar-hooks", "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": {
                "title": "Como utilizar Hooks",
                "subtitle": "Pensando em sincronização",
                "author": "Joseph Oliveira",
                "banner": { "url": "https://images.prismic.io/banner.png" },
                "content": [
                    { "heading": "Proin et varius",
                      "body": [ { "type": "paragraph", "text": "Nullam dolor sapien", "spans": [] } ] }
                ]
            }
        }"#;
        let doc: RawDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.uid.as_deref(), Some("como-utilizar-hooks"));
        assert_eq!(doc.data.title.as_string(), "Como utilizar Hooks");
        assert_eq!(doc.data.content.len(), 1);
        assert_eq!(doc.data.content[0].body[0].text(), "Nullam dolor sapien");
    }

    #[test]
    fn test_parse_degraded_document() {
        let json = r#"{
            "uid": "broken",
            "first_publication_date": null,
            "data": { "title": [ { "type": "heading1", "text": "Rich" } ],
                      "banner": null,
                      "content": [ { "heading": null, "body": "oops" }, 42 ] }
        }"#;
        let doc: RawDocument = serde_json::from_str(json).unwrap();
        assert!(doc.first_publication_date.is_none());
        assert!(doc.data.banner.is_none());
        assert_eq!(doc.data.title.as_string(), "Rich");
        assert_eq!(doc.data.author.as_string(), "");
        assert_eq!(doc.data.content.len(), 1);
        assert!(doc.data.content[0].body.is_empty());
        assert_eq!(doc.data.content[0].heading.as_string(), "");
    }

    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "page": 1, "results_per_page": 1, "total_results_size": 2, "total_pages": 2,
            "next_page": "https://x.cdn.prismic.io/api/v2/documents/search?page=2",
            "prev_page": null,
            "results": [ { "uid": "a", "data": {} } ]
        }"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.results.len(), 1);
        assert!(resp.next_page.is_some());
    }
}
