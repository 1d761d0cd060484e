//! Error types for the feed pipeline.
//!
//! Two layers:
//! - [`FeedError`]: run-level failures that abort the whole pipeline and are
//!   reported to the caller (the scheduler must not record a successful run).
//! - [`ItemError`]: a single event block could not be turned into a record.
//!   These are logged and the block is skipped; they never leave the extractor.

use std::path::PathBuf;
use thiserror::Error;

/// Run-level pipeline errors.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Source unavailable: {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },

    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render feed: {0}")]
    Render(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Run marker error at {}: {reason}", .path.display())]
    Marker { path: PathBuf, reason: String },
}

impl FeedError {
    /// Wrap any displayable serializer error as [`FeedError::Render`].
    pub fn render<E: std::fmt::Display>(e: E) -> Self {
        FeedError::Render(e.to_string())
    }
}

/// Reasons a single event block is skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    #[error("Missing required node: {0}")]
    MissingNode(&'static str),

    #[error("Node {node} has no {attr} attribute")]
    MissingAttr {
        node: &'static str,
        attr: &'static str,
    },

    #[error("Node {node} links to an unusable URL: {href}")]
    BadLink { node: &'static str, href: String },

    #[error("No numeric event id in link: {0}")]
    NoEventId(String),

    #[error("Unparsable timestamp: {0}")]
    BadTimestamp(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unavailable_message() {
        let e = FeedError::SourceUnavailable {
            url: "https://itch.io/my-feed".to_string(),
            reason: "HTTP 503".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Source unavailable: https://itch.io/my-feed: HTTP 503"
        );
    }

    #[test]
    fn test_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = FeedError::WriteFailed {
            path: PathBuf::from("/nope/itchio.atom"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("/nope/itchio.atom"));
        assert!(e.source().is_some());
    }

    #[test]
    fn test_item_error_display() {
        assert_eq!(
            ItemError::MissingAttr {
                node: "event_time",
                attr: "title"
            }
            .to_string(),
            "Node event_time has no title attribute"
        );
    }
}
