//! Once-a-day run gating.
//!
//! The last successful run is remembered as a day-of-week index (Sunday = 0)
//! in a small JSON file:
//!
//! ```json
//! {"lastrun": 3}
//! ```
//!
//! A missing file means "never ran" and is represented by [`NEVER_RAN`], a
//! value no weekday can equal, so the first run always goes ahead. The marker
//! is written only after the feed has been delivered; a failed run leaves it
//! alone so the next trigger retries.

use crate::error::FeedError;
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Marker value before the first successful run.
pub const NEVER_RAN: u32 = 99_999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RunMarker {
    pub lastrun: u32,
}

impl Default for RunMarker {
    fn default() -> Self {
        Self { lastrun: NEVER_RAN }
    }
}

impl RunMarker {
    /// Read the marker at `path`.
    ///
    /// Missing or unreadable JSON both count as "never ran"; only real I/O
    /// failures are errors.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, FeedError> {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No run marker yet");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(FeedError::Marker {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };
        match serde_json::from_str::<RunMarker>(&raw) {
            Ok(marker) => Ok(marker),
            Err(e) => {
                warn!(error = %e, "Corrupt run marker; treating as never ran");
                Ok(Self::default())
            }
        }
    }

    /// Whether the pipeline should run on weekday `today`.
    pub fn should_run(&self, today: u32) -> bool {
        self.lastrun != today
    }

    /// Persist `today` as the last successful run.
    #[instrument(level = "info", skip_all, fields(path = %path.display(), today = today))]
    pub async fn record(path: &Path, today: u32) -> Result<(), FeedError> {
        let marker_err = |e: &dyn std::fmt::Display| FeedError::Marker {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| marker_err(&e))?;
        }
        let json = serde_json::to_string(&RunMarker { lastrun: today }).map_err(|e| marker_err(&e))?;
        fs::write(path, json).await.map_err(|e| marker_err(&e))?;
        info!("Recorded successful run");
        Ok(())
    }
}

/// Local day of week, Sunday = 0 … Saturday = 6.
pub fn today_index() -> u32 {
    Local::now().weekday().num_days_from_sunday()
}
