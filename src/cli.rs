//! Command-line interface definitions for itchio_atom.
//!
//! All options have defaults, so the binary can be dropped into a startup
//! script or cron entry as-is.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Fetch the live page, write ./itchio.atom, at most once per day
/// itchio_atom
///
/// # Convert a page saved from a logged-in browser, ignoring the daily gate
/// itchio_atom -i ~/Downloads/my-feed.html -o ~/feeds --force
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory the Atom file is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Optional path to a YAML feed configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read the activity page from this file instead of fetching it
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the activity page URL from the configuration
    #[arg(long, env = "ITCHIO_FEED_URL")]
    pub url: Option<String>,

    /// Where the last-run marker lives (default: <output-dir>/.itchio_lastrun.json)
    #[arg(long)]
    pub marker: Option<PathBuf>,

    /// Run even if the feed was already generated today
    #[arg(short, long)]
    pub force: bool,
}

impl Cli {
    /// Resolved path of the last-run marker file.
    pub fn marker_path(&self) -> PathBuf {
        self.marker
            .clone()
            .unwrap_or_else(|| self.output_dir.join(".itchio_lastrun.json"))
    }
}
