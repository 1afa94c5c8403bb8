//! Content source errors

use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the content source
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport failure: DNS, connect, timeout
    #[error("content source unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// Non-2xx response
    #[error("content source returned {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body was not the expected JSON
    #[error("could not decode content source response from {url}: {message}")]
    Decode { url: String, message: String },

    /// No document with this UID
    #[error("document not found: {type_tag}/{uid}")]
    NotFound { type_tag: String, uid: String },

    /// A page token this source did not issue
    #[error("invalid page token: {0}")]
    InvalidToken(String),

    #[error("invalid content source configuration: {0}")]
    Config(String),

    #[error("fixture {path:?}: {message}")]
    Fixture { path: PathBuf, message: String },
}

impl SourceError {
    /// Create a not-found error for a document
    pub fn not_found(type_tag: &str, uid: &str) -> Self {
        Self::NotFound {
            type_tag: type_tag.to_string(),
            uid: uid.to_string(),
        }
    }

    /// Whether the document is definitively unknown, as opposed to a
    /// transient failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
