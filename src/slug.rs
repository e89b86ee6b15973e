//! Derives deterministic, filesystem-safe output paths for posts from their
//! title and publish time.
//!
//! Slugs only carry the publish time to the minute. Two posts with the same
//! title published in the same minute get the same slug, and whichever is
//! written last overwrites the other. Nothing detects or resolves this.

use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// The time component appended to flat slugs.
pub const STAMP_FORMAT: &str = "%Y%m%d%H%M";

/// Converts a title and publish time into a slug of the form
/// `<title>-<yyyymmddhhmm>`. The title is lowercased, spaces become hyphens,
/// everything outside `[a-z0-9-_]` is dropped, and runs of hyphens collapse
/// into one.
pub fn slug(title: &str, published: &DateTime<Utc>) -> String {
    let mut slug = clean(title);
    if !slug.ends_with('-') {
        slug.push('-');
    }
    slug.push_str(&published.format(STAMP_FORMAT).to_string());
    slug
}

fn clean(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.trim().chars().flat_map(char::to_lowercase) {
        let c = if c == ' ' { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_') {
            continue;
        }
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out
}

/// How post output paths are laid out under `deploy/posts/`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `<title>-<yyyymmddhhmm>/index.html`
    Flat,

    /// `<yyyy>/<mm>/<dd>/<title>.html`. Posts sharing a title and a day
    /// collide.
    Dated,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Flat
    }
}

impl Layout {
    /// Computes the output location of a post.
    pub fn post_path(self, title: &str, published: &DateTime<Utc>) -> PostPath {
        match self {
            Layout::Flat => {
                let slug = slug(title, published);
                PostPath {
                    file: PathBuf::from(&slug).join("index.html"),
                    url: format!("/posts/{}/", slug),
                    slug,
                }
            }
            Layout::Dated => {
                let mut name = clean(title);
                if name.is_empty() {
                    name.push('-');
                }
                let dir = format!(
                    "{:04}/{:02}/{:02}",
                    published.year(),
                    published.month(),
                    published.day()
                );
                let slug = format!("{}/{}", dir, name);
                PostPath {
                    file: PathBuf::from(format!("{}.html", slug)),
                    url: format!("/posts/{}.html", slug),
                    slug,
                }
            }
        }
    }
}

impl FromStr for Layout {
    type Err = ParseLayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Layout::Flat),
            "dated" => Ok(Layout::Dated),
            _ => Err(ParseLayoutError(s.to_owned())),
        }
    }
}

/// Returned when a layout name is neither `flat` nor `dated`.
#[derive(Debug, thiserror::Error)]
#[error("unknown layout `{0}` (expected `flat` or `dated`)")]
pub struct ParseLayoutError(String);

/// Where a post is written and how it is linked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostPath {
    /// The slug itself.
    pub slug: String,

    /// The output file, relative to `deploy/posts/`.
    pub file: PathBuf,

    /// The site-absolute URL of the post.
    pub url: String,
}
