//! Helper functions for pages and templates

mod date;
mod url;

pub use date::*;
pub use url::*;

use chrono::{DateTime, FixedOffset};

use crate::config::SiteConfig;

/// Site-aware formatting helpers
#[derive(Debug, Clone)]
pub struct Helpers {
    locale: Locale,
    tz: chrono_tz::Tz,
    date_format: String,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            locale: Locale::from_tag(&config.language),
            tz: config.tz(),
            date_format: config.date_format.clone(),
        }
    }

    pub fn tz(&self) -> chrono_tz::Tz {
        self.tz
    }

    /// Format a publication date in the site's timezone and locale
    pub fn date(&self, date: &DateTime<FixedOffset>) -> String {
        format_localized(&date.with_timezone(&self.tz), &self.date_format, self.locale)
    }

    /// Parse and format a raw CMS timestamp; `None` when absent or unparseable
    pub fn display_date(&self, raw: Option<&str>) -> Option<String> {
        let raw = raw?;
        match parse_timestamp(raw) {
            Some(date) => Some(self.date(&date)),
            None => {
                tracing::debug!("Ignoring unparseable publication date {:?}", raw);
                None
            }
        }
    }
}
