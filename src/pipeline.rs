//! The fetch → normalize → extract → assemble → deliver pipeline.
//!
//! Only fetching and delivering wait on anything; everything in between is a
//! plain synchronous transform over the full page. A malformed event block is
//! dropped by the extractor and the run carries on; a failed fetch or write
//! ends the run with an error.
//!
//! [`run_if_due`] adds the once-a-day gate around [`run`]: the run marker is
//! consulted first and written only after the feed has been delivered.

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::models::{EventRecord, FeedDocument, RunReport};
use crate::outputs::atom::render_feed;
use crate::outputs::file::FeedSink;
use crate::schedule::RunMarker;
use crate::scrapers::itchio::EventExtractor;
use crate::scrapers::source::PageSource;
use crate::utils::absolutize_urls;
use chrono::{DateTime, Utc};
use scraper::Html;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};
use url::Url;

/// Run the pipeline unless it already succeeded on weekday `today`.
///
/// Returns `Ok(None)` when the run was skipped. With `force` the marker is not
/// read at all, so an unreadable marker cannot block a forced run. The marker
/// is written only after a successful delivery; any error leaves it as it was.
#[instrument(level = "info", skip_all, fields(marker = %marker_path.display(), today = today, force = force))]
pub async fn run_if_due<S, K>(
    source: &S,
    sink: &K,
    config: &FeedConfig,
    marker_path: &Path,
    today: u32,
    force: bool,
    now: DateTime<Utc>,
) -> Result<Option<RunReport>, FeedError>
where
    S: PageSource,
    K: FeedSink,
{
    if !force {
        let marker = RunMarker::load(marker_path).await?;
        info!(lastrun = marker.lastrun, today, "Checking run marker");
        if !marker.should_run(today) {
            info!("Feed already generated today; nothing to do");
            return Ok(None);
        }
    }

    let report = run(source, sink, config, now).await?;

    if let Err(e) = RunMarker::record(marker_path, today).await {
        // The feed is on disk; the worst case is one extra run on the next trigger.
        warn!(error = %e, "Failed to record run marker");
    }
    Ok(Some(report))
}

/// Run the whole pipeline once.
///
/// `now` stamps the feed's `<updated>` element.
#[instrument(level = "info", skip_all, fields(source = %source.location()))]
pub async fn run<S, K>(
    source: &S,
    sink: &K,
    config: &FeedConfig,
    now: DateTime<Utc>,
) -> Result<RunReport, FeedError>
where
    S: PageSource,
    K: FeedSink,
{
    let t0 = Instant::now();
    let markup = source.fetch().await?;

    let (document, skipped) = build_document(&markup, config, now)?;
    info!(
        entries = document.entries,
        skipped,
        "Built feed document"
    );

    let path = sink.deliver(&document, &config.filename).await?;
    info!(
        path = %path.display(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Pipeline complete"
    );
    Ok(RunReport {
        entries: document.entries,
        skipped,
        path,
    })
}

/// The synchronous middle of the pipeline: markup in, Atom document out.
///
/// Returns the document and the number of event blocks that were skipped.
pub fn build_document(
    markup: &str,
    config: &FeedConfig,
    now: DateTime<Utc>,
) -> Result<(FeedDocument, usize), FeedError> {
    let origin = Url::parse(&config.origin)
        .map_err(|e| FeedError::Config(format!("origin {:?}: {e}", config.origin)))?;
    let normalized = absolutize_urls(markup, &config.origin);
    let (records, skipped) = extract_records(&normalized, origin);
    let document = render_feed(config, records, now)?;
    Ok((document, skipped))
}

/// Parse normalized markup and collect every well-formed event, in page order.
pub fn extract_records(normalized: &str, origin: Url) -> (Vec<EventRecord>, usize) {
    let html = Html::parse_document(normalized);
    let mut extractor = EventExtractor::new(&html, origin);
    let records = extractor.by_ref().collect::<Vec<_>>();
    (records, extractor.skipped())
}
