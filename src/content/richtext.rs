//! Structured rich text as delivered by the CMS
//!
//! A body is a list of blocks (`paragraph`, `heading2`, `list-item`, ...),
//! each carrying plain text plus formatting spans addressed by character
//! offsets. Conversion never fails: unknown block types render as
//! paragraphs and out-of-range spans are ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// A single rich-text block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub spans: Vec<Span>,
}

impl RichTextBlock {
    /// Paragraph block with the given text
    pub fn paragraph(text: &str) -> Self {
        Self {
            kind: "paragraph".to_string(),
            text: Some(text.to_string()),
            spans: Vec::new(),
        }
    }

    /// Text of the block, empty when absent
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Formatting applied to a character range of a block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Option<serde_json::Value>,
}

impl Span {
    /// Link target, if it is a web or mail address or a site path
    fn href(&self) -> Option<&str> {
        let href = self.data.as_ref()?.get("url")?.as_str()?;
        if href.starts_with('/') {
            return Some(href);
        }
        match url::Url::parse(href).ok()?.scheme() {
            "http" | "https" | "mailto" => Some(href),
            scheme => {
                tracing::debug!("Dropping {} link", scheme);
                None
            }
        }
    }

    fn open_tag(&self) -> Option<String> {
        match self.kind.as_str() {
            "strong" => Some("<strong>".to_string()),
            "em" => Some("<em>".to_string()),
            "hyperlink" => {
                let href = self.href()?;
                Some(format!(
                    r#"<a href="{}" target="_blank" rel="noopener">"#,
                    escape_html(href)
                ))
            }
            _ => None,
        }
    }

    fn close_tag(&self) -> &'static str {
        match self.kind.as_str() {
            "strong" => "</strong>",
            "em" => "</em>",
            _ => "</a>",
        }
    }
}

/// Deserialize a list, treating `null` or a non-list as empty and dropping
/// elements that do not match the expected shape
pub fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Plain text of a body, one line per block
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(RichTextBlock::text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a body to HTML
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list_tag = match block.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        let inner = render_spans(block.text(), &block.spans);
        let element = match block.kind.as_str() {
            "heading1" => "h1",
            "heading2" => "h2",
            "heading3" => "h3",
            "heading4" => "h4",
            "heading5" => "h5",
            "heading6" => "h6",
            "preformatted" => "pre",
            "list-item" | "o-list-item" => "li",
            _ => {
                if block.text().is_empty() {
                    continue;
                }
                "p"
            }
        };
        html.push_str(&format!("<{0}>{1}</{0}>", element, inner));
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

/// Apply spans to text. Overlapping spans are closed at the boundary of the
/// span that started first, which keeps the output well-formed.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.end <= chars.len())
        .collect();
    spans.sort_by_key(|s| (s.start, std::cmp::Reverse(s.end)));

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<(&Span, usize)> = Vec::new();
    let mut next = 0;

    for (pos, c) in chars.iter().enumerate() {
        while let Some((span, end)) = stack.last() {
            if *end == pos {
                out.push_str(span.close_tag());
                stack.pop();
            } else {
                break;
            }
        }
        while next < spans.len() && spans[next].start == pos {
            let span = spans[next];
            next += 1;
            // Clamp to the enclosing span
            let end = stack.last().map_or(span.end, |(_, e)| span.end.min(*e));
            if let Some(tag) = span.open_tag() {
                out.push_str(&tag);
                stack.push((span, end));
            }
        }
        push_escaped(&mut out, *c);
    }

    while let Some((span, _)) = stack.pop() {
        out.push_str(span.close_tag());
    }

    out
}

/// Escape HTML special characters
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        push_escaped(&mut out, c);
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(c),
    }
}
