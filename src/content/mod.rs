//! Content module - post projections, rich text and reading time

mod post;
pub mod raw;
pub mod reading;
pub mod richtext;

pub use post::{ContentDetail, ContentSummary, Section};
pub use reading::{reading_time, word_count};
pub use richtext::RichTextBlock;
