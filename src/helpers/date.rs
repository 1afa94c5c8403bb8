//! Date helper functions

use chrono::{DateTime, Datelike, FixedOffset, TimeZone};

/// Display locale for dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    PtBr,
    EnUs,
}

impl Locale {
    /// Resolve a language tag such as `pt-BR` or `en`; unknown tags use `pt-BR`
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase().replace('_', "-");
        if tag == "en" || tag.starts_with("en-") {
            Locale::EnUs
        } else {
            Locale::PtBr
        }
    }

    fn month_short(self, month0: usize) -> &'static str {
        const PT: [&str; 12] = [
            "jan.", "fev.", "mar.", "abr.", "mai.", "jun.", "jul.", "ago.", "set.", "out.",
            "nov.", "dez.",
        ];
        const EN: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        match self {
            Locale::PtBr => PT[month0],
            Locale::EnUs => EN[month0],
        }
    }

    fn month_long(self, month0: usize) -> &'static str {
        const PT: [&str; 12] = [
            "janeiro",
            "fevereiro",
            "março",
            "abril",
            "maio",
            "junho",
            "julho",
            "agosto",
            "setembro",
            "outubro",
            "novembro",
            "dezembro",
        ];
        const EN: [&str; 12] = [
            "January",
            "February",
            "March",
            "April",
            "May",
            "June",
            "July",
            "August",
            "September",
            "October",
            "November",
            "December",
        ];
        match self {
            Locale::PtBr => PT[month0],
            Locale::EnUs => EN[month0],
        }
    }
}

/// Parse a CMS publication timestamp (`2021-03-15T19:25:28+0000` or RFC 3339)
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
}

/// Format a date for display in the given locale
///
/// `P`, `PP` and `PPP` are the short, medium and long localized date forms.
/// Anything else is treated as a Moment.js-style pattern.
///
/// # Examples
/// ```ignore
/// format_localized(&date, "PP", Locale::PtBr) // -> "15 de jan. de 2024"
/// format_localized(&date, "PP", Locale::EnUs) // -> "Jan 15, 2024"
/// ```
pub fn format_localized<Tz: TimeZone>(date: &DateTime<Tz>, format: &str, locale: Locale) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let day = date.day();
    let month0 = date.month0() as usize;
    let year = date.year();

    match (format, locale) {
        ("P", Locale::PtBr) => date.format("%d/%m/%Y").to_string(),
        ("P", Locale::EnUs) => date.format("%m/%d/%Y").to_string(),
        ("PP", Locale::PtBr) => format!("{} de {} de {}", day, locale.month_short(month0), year),
        ("PP", Locale::EnUs) => format!("{} {}, {}", locale.month_short(month0), day, year),
        ("PPP", Locale::PtBr) => format!("{} de {} de {}", day, locale.month_long(month0), year),
        ("PPP", Locale::EnUs) => format!(
            "{} {}{}, {}",
            locale.month_long(month0),
            day,
            ordinal_suffix(day),
            year
        ),
        _ => format_date(date, format),
    }
}

/// Format a date using Moment.js-compatible format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "YYYY-MM-DD") // -> "2024-01-15"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let chrono_format = moment_to_chrono_format(format);
    date.format(&chrono_format).to_string()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest patterns first within each category
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
