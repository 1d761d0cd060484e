//! Markup sources for the activity page.
//!
//! The pipeline only needs "give me the page text". [`PageSource`] is that
//! seam; [`HttpSource`] fetches the live page and [`FileSource`] reads a page
//! saved from a browser session.
//!
//! Any failure here is a [`FeedError::SourceUnavailable`]: the run stops and
//! no document is produced.

use crate::error::FeedError;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Something that can produce the raw activity-page markup.
// Only used with concrete types and awaited in place, never spawned, so the
// returned futures need no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Human-readable location, used in logs and errors.
    fn location(&self) -> String;

    /// Fetch the full page text.
    async fn fetch(&self) -> Result<String, FeedError>;
}

/// Fetches the page over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self, FeedError> {
        let url = url.into();
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::SourceUnavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { client, url })
    }

    fn unavailable(&self, reason: impl ToString) -> FeedError {
        FeedError::SourceUnavailable {
            url: self.url.clone(),
            reason: reason.to_string(),
        }
    }
}

impl PageSource for HttpSource {
    fn location(&self) -> String {
        self.url.clone()
    }

    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn fetch(&self) -> Result<String, FeedError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Feed page returned non-success status");
            return Err(self.unavailable(format!("HTTP {status}")));
        }

        let body = response.text().await.map_err(|e| self.unavailable(e))?;
        info!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched feed page"
        );
        Ok(body)
    }
}

/// Reads a saved copy of the page from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PageSource for FileSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<String, FeedError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FeedError::SourceUnavailable {
                url: self.location(),
                reason: e.to_string(),
            })?;
        info!(bytes = body.len(), "Read saved feed page");
        Ok(body)
    }
}
