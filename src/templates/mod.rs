//! Built-in site templates using the Tera template engine
//!
//! Templates are embedded in the binary. Values are escaped by Tera; only
//! rendered rich text is inserted with `safe`.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{reading_time, richtext, ContentDetail};
use crate::helpers::{date_xml, Helpers};

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("loading.html", include_str!("site/loading.html")),
            ("404.html", include_str!("site/404.html")),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub url: String,
    pub logo: String,
    pub language: String,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            url: config.url.clone(),
            logo: config.logo.clone(),
            language: config.language.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Option<String>,
    /// Localized publication date
    pub date: Option<String>,
    pub date_xml: Option<String>,
    /// Minutes
    pub reading_time: usize,
    pub sections: Vec<SectionData>,
}

impl PostData {
    /// Build the view of a post; reading time is computed here, on every render
    pub fn new(detail: &ContentDetail, helpers: &Helpers, words_per_minute: usize) -> Self {
        Self {
            uid: detail.uid.clone(),
            title: detail.title.clone(),
            subtitle: detail.subtitle.clone(),
            author: detail.author.clone(),
            banner: detail.banner.clone(),
            date: detail.first_publication_date.as_ref().map(|d| helpers.date(d)),
            date_xml: detail.first_publication_date.as_ref().map(date_xml),
            reading_time: reading_time(&detail.sections, words_per_minute),
            sections: detail
                .sections
                .iter()
                .map(|s| SectionData {
                    heading: s.heading.clone(),
                    html: richtext::as_html(&s.body),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    pub html: String,
}
