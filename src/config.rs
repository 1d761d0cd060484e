//! Feed envelope configuration.
//!
//! The envelope (identity, title, artwork) and the source location are fixed
//! per deployment. A [`FeedConfig`] is built once at startup, either from the
//! built-in itch.io defaults or from a YAML file, and handed to the pipeline
//! by reference.
//!
//! ```yaml
//! site: itch.io
//! origin: https://itch.io
//! feed_url: https://itch.io/my-feed
//! tag_year: 2021
//! filename: itchio.atom
//! ```
//!
//! Any omitted key keeps its default.

use crate::error::FeedError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeedConfig {
    /// Host name used in `tag:` URIs.
    pub site: String,
    /// Scheme + host prepended to site-relative references. No trailing slash.
    pub origin: String,
    /// Page holding the activity feed.
    pub feed_url: String,
    /// Year component of `tag:` URIs. Changing it changes every entry id.
    pub tag_year: u16,
    pub title: String,
    pub icon: String,
    pub subtitle: String,
    pub logo: String,
    /// Output file name; overwritten on every run.
    pub filename: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            site: "itch.io".to_string(),
            origin: "https://itch.io".to_string(),
            feed_url: "https://itch.io/my-feed".to_string(),
            tag_year: 2021,
            title: "Itch.io Atom User Feed".to_string(),
            icon: "https://itch.io/favicon.ico".to_string(),
            subtitle: "Your itch.io subscriptions as an Atom feed".to_string(),
            logo: "https://itch.io/static/images/itchio-square-144.png".to_string(),
            filename: "itchio.atom".to_string(),
        }
    }
}

impl FeedConfig {
    /// Load a config from a YAML file and validate it.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FeedError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_yaml(&raw)?;
        info!(site = %config.site, feed_url = %config.feed_url, "Loaded feed configuration");
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self, FeedError> {
        let config: FeedConfig =
            serde_yaml::from_str(raw).map_err(|e| FeedError::Config(e.to_string()))?;
        config.validated()
    }

    /// Check URLs and normalize the origin.
    pub fn validated(mut self) -> Result<Self, FeedError> {
        let origin = Url::parse(&self.origin)
            .map_err(|e| FeedError::Config(format!("origin {:?}: {e}", self.origin)))?;
        if origin.cannot_be_a_base() || origin.host_str().is_none() {
            return Err(FeedError::Config(format!(
                "origin {:?} is not an absolute http(s) URL",
                self.origin
            )));
        }
        Url::parse(&self.feed_url)
            .map_err(|e| FeedError::Config(format!("feed_url {:?}: {e}", self.feed_url)))?;
        if self.site.trim().is_empty() {
            return Err(FeedError::Config("site must not be empty".to_string()));
        }
        if self.filename.trim().is_empty() || self.filename.contains(['/', '\\']) {
            return Err(FeedError::Config(format!(
                "filename {:?} must be a bare file name",
                self.filename
            )));
        }
        self.origin = self.origin.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// `tag:<site>,<year>:<suffix>`
    pub fn tag_uri(&self, suffix: &str) -> String {
        format!("tag:{},{}:{}", self.site, self.tag_year, suffix)
    }
}
