//! itch.io activity feed extractor.
//!
//! The "my feed" page renders each activity as an `.event_row` block:
//!
//! ```html
//! <div class="event_row">
//!   <div class="event_header">
//!     <div class="event_user_action">
//!       <a href="https://cavesrd.itch.io" class="event_source_user">caves rd</a>
//!       <strong>updated a beta</strong>
//!       <a href="/event/6558640" title="2021-05-13 17:43:49" class="event_time">1 day ago</a>
//!     </div>
//!   </div>
//!   <div class="game_thumb" data-background_image="https://img.itch.zone/..."></div>
//!   <div class="event_main_content">...</div>
//! </div>
//! ```
//!
//! Markup is expected to have gone through [`crate::utils::absolutize_urls`].
//! The two links copied into a record (event permalink, author page) are
//! additionally resolved against the site origin, so a reference the textual
//! rewrite could not see still ends up absolute.

use crate::error::ItemError;
use crate::models::EventRecord;
use crate::summary::compose_summary;
use crate::utils::{escape_xml, truncate_for_log};
use chrono::NaiveDateTime;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::html::Select;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

static EVENT_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse(".event_row").unwrap());
static EVENT_TIME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".event_header .event_user_action .event_time").unwrap());
static EVENT_USER: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".event_header .event_user_action .event_source_user").unwrap()
});
static EVENT_ACTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".event_header .event_user_action strong").unwrap());
static GAME_THUMB: Lazy<Selector> = Lazy::new(|| Selector::parse(".game_thumb").unwrap());
static MAIN_CONTENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".event_main_content").unwrap());

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Display format of the `title` attribute on `.event_time` links. Always UTC.
const SITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Lazily turns every `.event_row` of a parsed page into an [`EventRecord`].
///
/// Malformed rows are logged and skipped; [`EventExtractor::skipped`] reports
/// how many. Ids that repeat within the page get a `-<n>` suffix so no entry
/// shadows another.
pub struct EventExtractor<'a> {
    rows: Select<'a, 'static>,
    origin: Url,
    seen: HashMap<String, usize>,
    position: usize,
    skipped: usize,
}

impl<'a> EventExtractor<'a> {
    /// `origin` is the base relative links in the page are resolved against.
    pub fn new(document: &'a Html, origin: Url) -> Self {
        Self {
            rows: document.select(&EVENT_ROW),
            origin,
            seen: HashMap::new(),
            position: 0,
            skipped: 0,
        }
    }

    /// Rows dropped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn unique_id(&mut self, id: String) -> String {
        let count = self.seen.entry(id.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            id
        } else {
            let unique = format!("{id}-{count}");
            warn!(%id, %unique, "Duplicate event id on page; disambiguating");
            unique
        }
    }
}

impl Iterator for EventExtractor<'_> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = self.rows.next()?;
            let position = self.position;
            self.position += 1;
            match extract_event(row, &self.origin) {
                Ok(mut record) => {
                    record.id = self.unique_id(record.id);
                    debug!(position, id = %record.id, "Extracted event");
                    return Some(record);
                }
                Err(e) => {
                    self.skipped += 1;
                    warn!(
                        position,
                        error = %e,
                        snippet = %truncate_for_log(&row.html(), 200),
                        "Skipping malformed event row"
                    );
                }
            }
        }
    }
}

/// Project a single `.event_row` into a record.
pub fn extract_event(row: ElementRef<'_>, origin: &Url) -> Result<EventRecord, ItemError> {
    let time = row
        .select(&EVENT_TIME)
        .next()
        .ok_or(ItemError::MissingNode("event_time"))?;
    let user = row
        .select(&EVENT_USER)
        .next()
        .ok_or(ItemError::MissingNode("event_source_user"))?;
    let action = row.select(&EVENT_ACTION).next();
    let preview = row.select(&GAME_THUMB).next();
    let body = row.select(&MAIN_CONTENT).next();

    let permalink = time.value().attr("href").ok_or(ItemError::MissingAttr {
        node: "event_time",
        attr: "href",
    })?;
    let permalink = absolute_link(permalink, origin, "event_time")?;
    let stamp = time.value().attr("title").ok_or(ItemError::MissingAttr {
        node: "event_time",
        attr: "title",
    })?;
    let author_uri = user.value().attr("href").ok_or(ItemError::MissingAttr {
        node: "event_source_user",
        attr: "href",
    })?;
    let author_uri = absolute_link(author_uri, origin, "event_source_user")?;

    let actor_text = visible_text(user);
    let action_text = action.map(visible_text).unwrap_or_default();

    let author_name = escape_xml(&actor_text);
    let title = if action_text.is_empty() {
        author_name.clone()
    } else {
        format!("{} {}", author_name, escape_xml(&action_text))
    };

    Ok(EventRecord {
        id: format!("event{}", event_number(&permalink)?),
        published_at: to_atom_timestamp(stamp)?,
        author_name,
        author_uri,
        permalink,
        title,
        content: compose_summary(&actor_text, &action_text, preview, body),
    })
}

/// Absolute links pass through untouched; relative ones are joined onto `origin`.
fn absolute_link(href: &str, origin: &Url, node: &'static str) -> Result<String, ItemError> {
    let bad_link = || ItemError::BadLink {
        node,
        href: href.to_string(),
    };
    match Url::parse(href.trim()) {
        Ok(_) => Ok(href.trim().to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => origin
            .join(href.trim())
            .map(|url| url.to_string())
            .map_err(|_| bad_link()),
        Err(_) => Err(bad_link()),
    }
}

/// First run of digits in the link's path, e.g. `6558640` for `/event/6558640`.
///
/// The path is searched rather than the full URL so digits in the host or port
/// are never mistaken for the event number.
pub fn event_number(link: &str) -> Result<String, ItemError> {
    let parsed = Url::parse(link).ok();
    let haystack = parsed.as_ref().map(Url::path).unwrap_or(link);
    DIGITS
        .find(haystack)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ItemError::NoEventId(link.to_string()))
}

/// `2021-05-13 17:43:49` → `2021-05-13T17:43:49.000+00:00`.
pub fn to_atom_timestamp(stamp: &str) -> Result<String, ItemError> {
    let parsed = NaiveDateTime::parse_from_str(stamp.trim(), SITE_TIMESTAMP)
        .map_err(|_| ItemError::BadTimestamp(stamp.to_string()))?;
    Ok(parsed.format("%Y-%m-%dT%H:%M:%S.000+00:00").to_string())
}

/// Element text with whitespace runs collapsed, roughly what a browser shows.
fn visible_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(time: &str, user: &str, extra: &str) -> String {
        format!(
            r#"<div class="event_row">
                 <div class="event_header"><div class="event_user_action">{user} <strong>updated a beta</strong> {time}</div></div>
                 {extra}
               </div>"#
        )
    }

    const TIME: &str = r#"<a href="https://itch.io/event/6558640" title="2021-05-13 17:43:49" data-label="event_permlink" class="event_time">1 day ago</a>"#;
    const USER: &str = r#"<a href="https://cavesrd.itch.io" data-label="event_user" class="event_source_user">caves rd</a>"#;

    fn records(html: &str) -> (Vec<EventRecord>, usize) {
        let doc = Html::parse_document(html);
        let mut extractor = EventExtractor::new(&doc, Url::parse("https://itch.io").unwrap());
        let records = extractor.by_ref().collect::<Vec<_>>();
        (records, extractor.skipped())
    }

    #[test]
    fn test_extracts_full_record() {
        let html = row(
            TIME,
            USER,
            r#"<div class="game_thumb" data-background_image="https://img.itch.zone/t.png"></div>
               <div class="event_main_content"><p>New build</p></div>"#,
        );
        let (records, skipped) = records(&html);
        assert_eq!(skipped, 0);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id, "event6558640");
        assert_eq!(r.published_at, "2021-05-13T17:43:49.000+00:00");
        assert_eq!(r.author_name, "caves rd");
        assert_eq!(r.author_uri, "https://cavesrd.itch.io");
        assert_eq!(r.permalink, "https://itch.io/event/6558640");
        assert_eq!(r.title, "caves rd updated a beta");
        assert!(r.content.starts_with("<h1>caves rd updated a beta</h1>"));
        assert!(r.content.contains(r#"<img src="https://img.itch.zone/t.png" />"#));
        assert!(r.content.ends_with("<p>New build</p>"));
    }

    #[test]
    fn test_missing_preview_still_extracts() {
        let html = row(TIME, USER, r#"<div class="event_main_content">Body</div>"#);
        let (records, skipped) = records(&html);
        assert_eq!((records.len(), skipped), (1, 0));
        assert!(!records[0].content.contains("<img"));
    }

    #[test]
    fn test_malformed_rows_skipped_in_order() {
        let no_time = row("", USER, "");
        let no_user = row(TIME, "", "");
        let second = TIME.replace("6558640", "6558641");
        let html = format!(
            "{}{}{}{}",
            row(TIME, USER, ""),
            no_time,
            no_user,
            row(&second, USER, "")
        );
        let (records, skipped) = records(&html);
        assert_eq!(skipped, 2);
        let ids = records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["event6558640", "event6558641"]);
    }

    #[test]
    fn test_duplicate_ids_disambiguated() {
        let html = format!("{}{}", row(TIME, USER, ""), row(TIME, USER, ""));
        let (records, _) = records(&html);
        assert_eq!(records[0].id, "event6558640");
        assert_eq!(records[1].id, "event6558640-2");
        assert_eq!(records[0].title, records[1].title);
    }

    #[test]
    fn test_title_and_author_escaped() {
        let user = r#"<a href="https://x.itch.io" class="event_source_user">Tom &amp; "Jerry"</a>"#;
        let (records, _) = records(&row(TIME, user, ""));
        assert_eq!(records[0].author_name, "Tom &amp; &quot;Jerry&quot;");
        assert_eq!(records[0].title, "Tom &amp; &quot;Jerry&quot; updated a beta");
    }

    #[test]
    fn test_missing_title_attribute_is_malformed() {
        let time = r#"<a href="https://itch.io/event/1" class="event_time">1 day ago</a>"#;
        let (records, skipped) = records(&row(time, USER, ""));
        assert!(records.is_empty());
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_relative_timestamp_is_malformed() {
        let time = r#"<a href="https://itch.io/event/1" title="1 day ago" class="event_time">1 day ago</a>"#;
        let (records, skipped) = records(&row(time, USER, ""));
        assert!(records.is_empty());
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_unquoted_relative_links_resolved() {
        let time = r#"<a href=/event/42 title="2021-05-13 17:43:49" class="event_time">1 day ago</a>"#;
        let user = r#"<a href=/u class="event_source_user">someone</a>"#;
        let (records, skipped) = records(&row(time, user, ""));
        assert_eq!(skipped, 0);
        let r = &records[0];
        assert_eq!(r.permalink, "https://itch.io/event/42");
        assert_eq!(r.author_uri, "https://itch.io/u");
        assert_eq!(r.id, "event42");
        assert!(!r.permalink.starts_with('/') && !r.author_uri.starts_with('/'));
    }

    #[test]
    fn test_absolute_links_kept_verbatim() {
        let origin = Url::parse("https://itch.io").unwrap();
        assert_eq!(
            absolute_link("https://cavesrd.itch.io", &origin, "event_source_user").unwrap(),
            "https://cavesrd.itch.io"
        );
        assert_eq!(
            absolute_link("event/9", &origin, "event_time").unwrap(),
            "https://itch.io/event/9"
        );
        assert!(matches!(
            absolute_link("http://[::1", &origin, "event_time"),
            Err(ItemError::BadLink { .. })
        ));
    }

    #[test]
    fn test_no_rows() {
        let (records, skipped) = records("<html><body><p>Nothing here</p></body></html>");
        assert!(records.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_event_number_ignores_port() {
        assert_eq!(event_number("http://localhost:8080/event/42").unwrap(), "42");
        assert_eq!(event_number("https://itch.io/event/6558640").unwrap(), "6558640");
        assert_eq!(event_number("/event/7").unwrap(), "7");
        assert!(matches!(
            event_number("https://itch.io/event/latest"),
            Err(ItemError::NoEventId(_))
        ));
    }

    #[test]
    fn test_to_atom_timestamp() {
        assert_eq!(
            to_atom_timestamp("2021-05-13 17:43:49").unwrap(),
            "2021-05-13T17:43:49.000+00:00"
        );
        assert!(to_atom_timestamp("yesterday").is_err());
    }
}
