//! # itchio_atom
//!
//! Turns the itch.io activity feed ("my feed") into an Atom document so new
//! posts, releases and community events show up in an ordinary feed reader.
//!
//! ## Usage
//!
//! ```sh
//! itchio_atom -o ~/feeds
//! ```
//!
//! ## Architecture
//!
//! 1. **Gate**: skip the run if it already succeeded today (see [`schedule`])
//! 2. **Fetch**: get the page over HTTP or from a saved file
//! 3. **Normalize**: make site-relative links absolute
//! 4. **Extract**: one record per well-formed `.event_row`
//! 5. **Assemble**: wrap the records in the Atom envelope
//! 6. **Deliver**: write `itchio.atom`, then record the run

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod schedule;
mod scrapers;
mod summary;
mod utils;

use cli::Cli;
use config::FeedConfig;
use outputs::file::FileSink;
use schedule::today_index;
use scrapers::source::{FileSource, HttpSource};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("itchio_atom starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = match &args.config {
        Some(path) => FeedConfig::load(path)?,
        None => FeedConfig::default(),
    };
    if let Some(url) = &args.url {
        config.feed_url = url.clone();
        config = config.validated()?;
    }

    // ---- Gate + run ----
    let marker_path = args.marker_path();
    let today = today_index();
    let sink = FileSink::new(&args.output_dir);
    let result = match &args.input {
        Some(path) => {
            let source = FileSource::new(path);
            pipeline::run_if_due(&source, &sink, &config, &marker_path, today, args.force, Utc::now()).await
        }
        None => {
            let source = HttpSource::new(config.feed_url.clone())?;
            pipeline::run_if_due(&source, &sink, &config, &marker_path, today, args.force, Utc::now()).await
        }
    };

    let report = match result {
        Ok(Some(report)) => report,
        Ok(None) => return Ok(()),
        Err(e) => {
            error!(error = %e, "Run failed; marker left unchanged");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        entries = report.entries,
        skipped = report.skipped,
        path = %report.path.display(),
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
