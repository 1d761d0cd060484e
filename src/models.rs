//! Data models for feed entries and the rendered document.
//!
//! - [`EventRecord`]: one normalized activity event, ready to become an Atom entry
//! - [`FeedDocument`]: the finished Atom text plus a little bookkeeping
//! - [`RunReport`]: what one successful pipeline run produced

use std::path::PathBuf;

/// One activity event scraped from the feed page.
///
/// Records are built once per run by the extractor and never mutated.
/// Text fields that end up as XML text (`author_name`, `title`) are already
/// escaped; `content` is raw HTML and is embedded in a CDATA section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// `event<digits>`, unique within one run.
    pub id: String,
    /// ISO-8601 with an explicit UTC offset, e.g. `2021-05-13T17:43:49.000+00:00`.
    pub published_at: String,
    /// Escaped display name of the actor.
    pub author_name: String,
    /// Absolute URL of the actor's page.
    pub author_uri: String,
    /// Absolute URL of the event itself.
    pub permalink: String,
    /// Escaped `"<author> <action>"`.
    pub title: String,
    /// HTML summary body.
    pub content: String,
}

/// A rendered Atom document.
#[derive(Debug, Clone)]
pub struct FeedDocument {
    /// Complete UTF-8 XML text.
    pub xml: String,
    /// Number of `entry` elements written.
    pub entries: usize,
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Entries written to the document.
    pub entries: usize,
    /// Event blocks dropped as malformed.
    pub skipped: usize,
    /// Where the sink put the document.
    pub path: PathBuf,
}
