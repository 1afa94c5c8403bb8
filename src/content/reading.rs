//! Reading-time estimation

use super::post::Section;
use super::richtext::as_text;

/// Default reading rate in words per minute
pub const WORDS_PER_MINUTE: usize = 200;

/// Count whitespace-separated words across every block of every section
pub fn word_count(sections: &[Section]) -> usize {
    sections
        .iter()
        .map(|s| as_text(&s.body).split_whitespace().count())
        .sum()
}

/// Estimated reading time in whole minutes, rounded up; 0 for an empty post
pub fn reading_time(sections: &[Section], words_per_minute: usize) -> usize {
    let words = word_count(sections);
    if words == 0 {
        return 0;
    }
    words.div_ceil(words_per_minute.max(1))
}
