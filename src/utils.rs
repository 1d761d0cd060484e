//! Text helpers shared by the extractor, the summary composer and the sinks.
//!
//! - XML escaping for plain-text fields
//! - Rewriting site-relative references to absolute ones
//! - String truncation for logging
//! - File system validation for the output directory

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Escape the five XML-reserved characters.
///
/// Every occurrence is replaced. The input is scanned once, so a `&` introduced
/// by one substitution is never escaped again by another.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(escape_xml("Tom & Jerry's <3"), "Tom &amp; Jerry&apos;s &lt;3");
/// ```
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

// `="/x`, `='/x`, ` attr=/x`, `url(/x`, `url("/x`, `url('/x`, `url(&quot;/x`.
// The character after the slash is captured so protocol-relative `//host` is left alone.
static RELATIVE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\s[\w:-]+=|=["']|url\((?:&quot;|["'])?)/([^/])"#).unwrap()
});

/// Rewrite every site-relative reference in `markup` to start with `origin`.
///
/// Purely textual: attribute values starting with `/` and relative `url(...)`
/// values in inline styles become `<origin>/...`. Protocol-relative references
/// (`//cdn.example`) are not touched.
///
/// # Arguments
///
/// * `markup` - Raw page markup
/// * `origin` - Scheme and host without a trailing slash, e.g. `https://itch.io`
pub fn absolutize_urls(markup: &str, origin: &str) -> String {
    RELATIVE_REF
        .replace_all(markup, |caps: &Captures| {
            format!("{}{}/{}", &caps[1], origin, &caps[2])
        })
        .into_owned()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and the number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a scratch file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &std::path::Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await?;
    let scratch_path = path.join("..__write_check__");
    stdfs::File::create(&scratch_path)?;
    let _ = stdfs::remove_file(&scratch_path);
    info!("Output directory is writable");
    Ok(())
}
