//! Per-route data loading
//!
//! These functions are the boundary between the content source and
//! rendering: they never return errors. A failed fetch becomes an empty
//! listing or a [`DetailState::NotFound`], and is logged.

mod index;
mod post;

pub use index::{index_props, IndexProps};
pub use post::{post_props, static_paths, DetailState, NotFoundCause};

use serde::Serialize;

/// Props for a pre-rendered route plus how long they stay fresh
#[derive(Debug, Clone, Serialize)]
pub struct StaticProps<T> {
    pub props: T,
    /// Seconds after which the page should be regenerated
    pub revalidate: u64,
}

impl<T> StaticProps<T> {
    pub fn new(props: T, revalidate: u64) -> Self {
        Self { props, revalidate }
    }
}
