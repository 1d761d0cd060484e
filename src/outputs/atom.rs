//! Atom (RFC 4287) rendering.
//!
//! Produces one self-contained document:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <feed xmlns="http://www.w3.org/2005/Atom" xml:lang="en">
//!   <id>tag:itch.io,2021:feed/itch.io</id>
//!   <title>…</title> <icon>…</icon> <subtitle>…</subtitle> <logo>…</logo>
//!   <link rel="alternate" type="text/html" href="https://itch.io/my-feed"/>
//!   <updated>2026-10-19T08:00:00.000Z</updated>
//!   <entry>…</entry>*
//! </feed>
//! ```
//!
//! Entry titles and author names arrive already escaped and are written as-is.
//! Summaries are HTML and go into CDATA sections.

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::models::{EventRecord, FeedDocument};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::{debug, instrument};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

type XmlWriter = Writer<Vec<u8>>;

/// Render `records` into a complete Atom document, preserving their order.
///
/// `updated` becomes the feed-level `<updated>` value.
#[instrument(level = "info", skip_all, fields(site = %config.site))]
pub fn render_feed<I>(
    config: &FeedConfig,
    records: I,
    updated: DateTime<Utc>,
) -> Result<FeedDocument, FeedError>
where
    I: IntoIterator<Item = EventRecord>,
{
    let mut w = Writer::new(Vec::new());

    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(FeedError::render)?;
    newline(&mut w)?;

    let mut feed = BytesStart::new("feed");
    feed.push_attribute(("xmlns", ATOM_NS));
    feed.push_attribute(("xml:lang", "en"));
    w.write_event(Event::Start(feed)).map_err(FeedError::render)?;
    newline(&mut w)?;

    text_element(&mut w, "id", &config.tag_uri(&format!("feed/{}", config.site)))?;
    text_element(&mut w, "title", &config.title)?;
    text_element(&mut w, "icon", &config.icon)?;
    text_element(&mut w, "subtitle", &config.subtitle)?;
    text_element(&mut w, "logo", &config.logo)?;
    alternate_link(&mut w, &config.feed_url)?;
    text_element(
        &mut w,
        "updated",
        &updated.to_rfc3339_opts(SecondsFormat::Millis, true),
    )?;
    newline(&mut w)?;

    let mut entries = 0usize;
    for record in records {
        write_entry(&mut w, config, &record)?;
        newline(&mut w)?;
        entries += 1;
    }

    w.write_event(Event::End(BytesEnd::new("feed")))
        .map_err(FeedError::render)?;
    newline(&mut w)?;

    let xml = String::from_utf8(w.into_inner()).map_err(FeedError::render)?;
    debug!(entries, bytes = xml.len(), "Rendered Atom document");
    Ok(FeedDocument { xml, entries })
}

fn write_entry(w: &mut XmlWriter, config: &FeedConfig, record: &EventRecord) -> Result<(), FeedError> {
    start(w, "entry")?;
    text_element(w, "id", &config.tag_uri(&record.id))?;
    text_element(w, "updated", &record.published_at)?;

    start(w, "author")?;
    escaped_element(w, "name", &record.author_name)?;
    text_element(w, "uri", &record.author_uri)?;
    end(w, "author")?;

    alternate_link(w, &record.permalink)?;
    escaped_element(w, "title", &record.title)?;

    let mut summary = BytesStart::new("summary");
    summary.push_attribute(("type", "html"));
    w.write_event(Event::Start(summary)).map_err(FeedError::render)?;
    write_cdata(w, &record.content)?;
    end(w, "summary")?;

    end(w, "entry")
}

/// Write `html` as one or more CDATA sections.
///
/// A literal `]]>` cannot appear inside CDATA, so the text is split between
/// `]]` and `>` and each piece gets its own section.
fn write_cdata(w: &mut XmlWriter, html: &str) -> Result<(), FeedError> {
    let mut rest = html;
    while let Some(at) = rest.find("]]>") {
        let (head, tail) = rest.split_at(at + 2);
        w.write_event(Event::CData(BytesCData::new(head)))
            .map_err(FeedError::render)?;
        rest = tail;
    }
    w.write_event(Event::CData(BytesCData::new(rest)))
        .map_err(FeedError::render)
}

fn alternate_link(w: &mut XmlWriter, href: &str) -> Result<(), FeedError> {
    let mut link = BytesStart::new("link");
    link.push_attribute(("rel", "alternate"));
    link.push_attribute(("type", "text/html"));
    link.push_attribute(("href", href));
    w.write_event(Event::Empty(link)).map_err(FeedError::render)
}

/// Element whose text still needs escaping.
fn text_element(w: &mut XmlWriter, name: &str, text: &str) -> Result<(), FeedError> {
    start(w, name)?;
    w.write_event(Event::Text(BytesText::new(text)))
        .map_err(FeedError::render)?;
    end(w, name)
}

/// Element whose text is already escaped.
fn escaped_element(w: &mut XmlWriter, name: &str, text: &str) -> Result<(), FeedError> {
    start(w, name)?;
    w.write_event(Event::Text(BytesText::from_escaped(text)))
        .map_err(FeedError::render)?;
    end(w, name)
}

fn start(w: &mut XmlWriter, name: &str) -> Result<(), FeedError> {
    w.write_event(Event::Start(BytesStart::new(name)))
        .map_err(FeedError::render)
}

fn end(w: &mut XmlWriter, name: &str) -> Result<(), FeedError> {
    w.write_event(Event::End(BytesEnd::new(name)))
        .map_err(FeedError::render)
}

fn newline(w: &mut XmlWriter) -> Result<(), FeedError> {
    w.write_event(Event::Text(BytesText::from_escaped("\n")))
        .map_err(FeedError::render)
}
