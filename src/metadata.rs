//! Extracts the metadata header from a post document. A header is a flat
//! block of `key: value` lines at the top of the document, terminated by a
//! line containing only `$endmeta`:
//!
//! ```text
//! title: Hello, world!
//! tags: greet, misc
//! postdate: 2014-03-02 15:04 MST
//! $endmeta
//! # Hello
//! ```
//!
//! Documents without the sentinel have no header; every field keeps its
//! configured default.

use crate::config::Defaults;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// The line that ends the metadata block.
pub const SENTINEL: &str = "$endmeta";

/// The `postdate` layout, minus the trailing zone abbreviation.
pub const POSTDATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// The header fields of a post, each either taken from the document or left
/// at its default.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    /// Empty unless the header supplies one; callers substitute the source
    /// file name.
    pub title: String,
    pub author: Option<String>,
    pub description: String,
    pub lang: String,
    pub dir: String,
    pub keywords: Vec<String>,
    pub date: DateTime<Utc>,
}

impl Metadata {
    /// Returns the metadata of a document with no header.
    pub fn with_defaults(defaults: &Defaults, now: DateTime<Utc>) -> Metadata {
        Metadata {
            title: String::new(),
            author: None,
            description: String::new(),
            lang: defaults.lang.clone(),
            dir: defaults.dir.clone(),
            keywords: defaults.keywords.clone(),
            date: now,
        }
    }
}

/// A document split into its header fields and its body.
#[derive(Clone, Debug, PartialEq)]
pub struct Parsed<'a> {
    pub metadata: Metadata,

    /// The raw, comma-separated tag list. See [`split_list`].
    pub tags: String,

    /// Everything after the sentinel line, or the whole input if there is no
    /// header.
    pub body: &'a str,

    /// The `postdate` value that failed to parse, if any. The date was
    /// replaced by the current time.
    pub invalid_postdate: Option<String>,
}

/// Parses the header of `input`, falling back to `defaults` for every key
/// the header omits.
pub fn parse<'a>(input: &'a str, defaults: &Defaults) -> Result<Parsed<'a>> {
    parse_at(input, defaults, Utc::now())
}

/// Like [`parse`], with `now` standing in for the current time.
pub fn parse_at<'a>(input: &'a str, defaults: &Defaults, now: DateTime<Utc>) -> Result<Parsed<'a>> {
    let input = input.trim_start_matches('\u{feff}');
    let mut parsed = Parsed {
        metadata: Metadata::with_defaults(defaults, now),
        tags: defaults.tags.join(", "),
        body: input,
        invalid_postdate: None,
    };

    let (header, body) = match split_header(input) {
        Some(split) => split,
        None => return Ok(parsed),
    };
    parsed.body = body;

    let mut entries = entries(header)?;
    let meta = &mut parsed.metadata;
    if let Some(title) = entries.remove("title") {
        meta.title = title;
    }
    if let Some(author) = entries.remove("author") {
        meta.author = Some(author);
    }
    if let Some(description) = entries.remove("description") {
        meta.description = description;
    }
    if let Some(lang) = entries.remove("lang") {
        meta.lang = lang;
    }
    if let Some(dir) = entries.remove("dir") {
        meta.dir = dir;
    }
    if let Some(keywords) = entries.remove("keywords") {
        meta.keywords = split_list(&keywords);
    }
    if let Some(tags) = entries.remove("tags") {
        parsed.tags = tags;
    }
    if let Some(postdate) = entries.remove("postdate") {
        match parse_postdate(&postdate) {
            Some(date) => meta.date = date,
            None => parsed.invalid_postdate = Some(postdate),
        }
    }

    Ok(parsed)
}

/// Finds the sentinel line and returns the text before and after it.
fn split_header(input: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        if line.trim() == SENTINEL {
            return Some((&input[..offset], &input[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Reads the `key: value` (or `key = value`) entries of the unnamed leading
/// section. Keys are lowercased; the last occurrence of a key wins.
fn entries(header: &str) -> Result<HashMap<String, String>> {
    let mut entries = HashMap::new();
    let mut in_root = true;

    for (i, line) in header.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            if !line.ends_with(']') {
                return Err(Error::Malformed {
                    line: i + 1,
                    reason: "unterminated section header",
                });
            }
            // Only the unnamed section carries post metadata.
            in_root = false;
            continue;
        }

        let sep = line.find(|c: char| c == ':' || c == '=').ok_or(Error::Malformed {
            line: i + 1,
            reason: "expected `key: value`",
        })?;
        let key = line[..sep].trim();
        if key.is_empty() {
            return Err(Error::Malformed {
                line: i + 1,
                reason: "missing key",
            });
        }

        if in_root {
            entries.insert(key.to_lowercase(), line[sep + 1..].trim().to_owned());
        }
    }

    Ok(entries)
}

/// Parses a `postdate` value such as `2014-03-02 15:04 MST`. Zone
/// abbreviations carry no offset, so the time is taken as UTC. Returns
/// `None` for anything else.
pub fn parse_postdate(value: &str) -> Option<DateTime<Utc>> {
    let mut parts = value.trim().rsplitn(2, char::is_whitespace);
    let zone = parts.next()?;
    let stamp = parts.next()?.trim_end();

    if !(3..=5).contains(&zone.len()) || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    NaiveDateTime::parse_from_str(stamp, POSTDATE_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Splits a comma-separated list, trimming each entry and dropping empty
/// ones. Order and duplicates are preserved.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect()
}

/// The result of parsing a metadata header.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a syntactically invalid metadata header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Returned when a header line can't be read as a key/value pair.
    #[error("malformed metadata on line {line}: {reason}")]
    Malformed { line: usize, reason: &'static str },
}
