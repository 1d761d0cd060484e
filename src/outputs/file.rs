//! Delivering the rendered document.
//!
//! [`FeedSink`] is the seam between the pipeline and wherever the feed ends
//! up. [`FileSink`] writes it into a directory under a fixed name, replacing
//! the previous run's file.

use crate::error::FeedError;
use crate::models::FeedDocument;
use crate::utils::ensure_writable_dir;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Destination for a finished feed document.
// Only used with concrete types and awaited in place, never spawned, so the
// returned futures need no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait FeedSink {
    /// Persist `document` under `filename`, returning where it went.
    async fn deliver(&self, document: &FeedDocument, filename: &str) -> Result<PathBuf, FeedError>;
}

/// Writes the feed into a directory.
///
/// The document is written to a hidden temporary sibling first and then
/// renamed over the target, so a reader polling the file never sees a
/// half-written feed.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FeedSink for FileSink {
    #[instrument(level = "info", skip_all, fields(dir = %self.dir.display(), %filename))]
    async fn deliver(&self, document: &FeedDocument, filename: &str) -> Result<PathBuf, FeedError> {
        let target = self.dir.join(filename);
        let write_failed = |path: &Path, source: std::io::Error| {
            error!(path = %path.display(), error = %source, "Failed writing feed");
            FeedError::WriteFailed {
                path: path.to_path_buf(),
                source,
            }
        };

        ensure_writable_dir(&self.dir)
            .await
            .map_err(|e| write_failed(&self.dir, e))?;

        let staging = self.dir.join(format!(".{filename}.tmp"));
        fs::write(&staging, document.xml.as_bytes())
            .await
            .map_err(|e| write_failed(&staging, e))?;
        if let Err(e) = fs::rename(&staging, &target).await {
            let _ = fs::remove_file(&staging).await;
            return Err(write_failed(&target, e));
        }

        info!(
            path = %target.display(),
            entries = document.entries,
            bytes = document.xml.len(),
            "Wrote Atom feed"
        );
        Ok(target)
    }
}
