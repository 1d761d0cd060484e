//! Getting the activity page and turning it into records.
//!
//! Two halves:
//!
//! 1. **Sources** ([`source`]): anything that can hand back the raw page markup,
//!    either over HTTP or from a page saved to disk.
//! 2. **Extraction** ([`itchio`]): parse the (already URL-normalized) markup and
//!    yield one [`EventRecord`](crate::models::EventRecord) per event block.
//!
//! # Supported Sources
//!
//! | Source | Type | Notes |
//! |--------|------|-------|
//! | Live page | [`source::HttpSource`] | Plain GET, non-2xx is a failure |
//! | Saved page | [`source::FileSource`] | Useful when the page needs a logged-in browser |

pub mod itchio;
pub mod source;
