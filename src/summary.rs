//! HTML summary for a single feed entry.
//!
//! The summary is what a reader shows as the entry body:
//!
//! ```text
//! <h1>{actor} {action}</h1>
//! <img src="{preview}" />      (only when the event has a preview)
//! <br />
//! {event body, with rating glyphs turned into ★}
//! ```
//!
//! The result is raw HTML. The feed writer wraps it in CDATA, so nothing here
//! is escaped again later.

use crate::utils::escape_xml;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

/// Attribute holding the thumbnail URL on `.game_thumb` nodes.
const PREVIEW_ATTR: &str = "data-background_image";

// Star ratings are drawn with an icon span; its contents (svg, whitespace) vary.
static STAR_ICON: Lazy<Selector> = Lazy::new(|| Selector::parse("span.icon-star").unwrap());

/// Build the HTML body for one event.
///
/// # Arguments
///
/// * `actor` - Visible (unescaped) actor name
/// * `action` - Visible (unescaped) action text, e.g. "updated a beta"
/// * `preview` - The `.game_thumb` node, if the event has one
/// * `body` - The `.event_main_content` node, if present
pub fn compose_summary(
    actor: &str,
    action: &str,
    preview: Option<ElementRef<'_>>,
    body: Option<ElementRef<'_>>,
) -> String {
    let mut html = String::new();

    let heading = [actor, action]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(escape_xml)
        .collect::<Vec<_>>()
        .join(" ");
    html.push_str("<h1>");
    html.push_str(&heading);
    html.push_str("</h1>\n");

    if let Some(src) = preview.and_then(preview_src) {
        html.push_str("<img src=\"");
        html.push_str(&escape_xml(src));
        html.push_str("\" />\n<br />\n");
    }

    if let Some(body) = body {
        html.push_str(&replace_star_glyphs(body));
    }

    html
}

fn preview_src<'a>(preview: ElementRef<'a>) -> Option<&'a str> {
    preview
        .value()
        .attr(PREVIEW_ATTR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Inner HTML of `body` with every star-rating icon span, children included,
/// replaced by a literal `★`.
pub fn replace_star_glyphs(body: ElementRef<'_>) -> String {
    let mut html = body.inner_html();
    // Document order: an outer star span is replaced before any star nested in it.
    for glyph in body.select(&STAR_ICON).map(|star| star.html()).unique() {
        html = html.replace(&glyph, "★");
    }
    html
}
