//! Defines the [`Post`] type and the logic for loading a post from its source
//! document: header extraction ([`crate::metadata`]), markdown conversion
//! ([`crate::markdown`]), and output path computation ([`crate::slug`]).

use crate::config::Defaults;
use crate::markdown;
use crate::metadata::{self, split_list};
use crate::slug::{Layout, PostPath};
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// A single source document, fully parsed. Posts are built once during
/// discovery and only read afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The source document this post was loaded from.
    pub source: PathBuf,

    /// The post title, or the source file name if the header has none.
    pub title: String,
    pub author: Option<String>,
    pub description: String,
    pub lang: String,
    pub dir: String,
    pub keywords: Vec<String>,

    /// Tag names as written, in order. Duplicates are not removed here; see
    /// [`crate::graph::ContentGraph::associate`].
    pub tags: Vec<String>,

    /// The publish time. Never empty: an absent or unparseable `postdate`
    /// yields the load time.
    pub date: DateTime<Utc>,

    /// The markdown body, without the header.
    pub body: String,

    /// The rendered HTML body.
    pub html: String,

    /// The output location and URL.
    pub path: PostPath,
}

impl AsRef<Post> for Post {
    fn as_ref(&self) -> &Post {
        self
    }
}

impl Post {
    /// Reads and parses the document at `source`.
    pub fn load(source: &Path, defaults: &Defaults, layout: Layout) -> Result<Post> {
        let input = std::fs::read_to_string(source).map_err(|err| Error::Read {
            path: source.to_owned(),
            err,
        })?;
        Post::parse(source, &input, defaults, layout)
    }

    /// Parses a post from the contents of its source document. `source` is
    /// only used for the title fallback and error messages.
    pub fn parse(source: &Path, input: &str, defaults: &Defaults, layout: Layout) -> Result<Post> {
        let parsed = metadata::parse(input, defaults).map_err(|err| Error::Metadata {
            path: source.to_owned(),
            err,
        })?;

        if let Some(value) = &parsed.invalid_postdate {
            warn!(
                path = %source.display(),
                postdate = %value,
                "unparseable postdate; using the current time"
            );
        }

        let meta = parsed.metadata;
        let title = if meta.title.is_empty() {
            source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            meta.title
        };

        Ok(Post {
            source: source.to_owned(),
            path: layout.post_path(&title, &meta.date),
            title,
            author: meta.author,
            description: meta.description,
            lang: meta.lang,
            dir: meta.dir,
            keywords: meta.keywords,
            tags: split_list(&parsed.tags),
            date: meta.date,
            html: markdown::to_html(parsed.body),
            body: parsed.body.to_owned(),
        })
    }
}

/// The result of loading a [`Post`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Post`] from disk.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the source document can't be read.
    #[error("reading post `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when the metadata header is malformed.
    #[error("parsing post `{}`", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        err: metadata::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn defaults() -> Defaults {
        Defaults {
            tags: vec![String::from("Misc")],
            ..Defaults::default()
        }
    }

    #[test]
    fn test_parse() {
        let input = "title: Hello World\n\
                     tags: Go, go, rust\n\
                     postdate: 2020-01-01 12:00 UTC\n\
                     $endmeta\n\
                     Hi *there*.\n";
        let post = Post::parse(Path::new("posts/hello.md"), input, &defaults(), Layout::Flat).unwrap();

        assert_eq!(post.title, "Hello World");
        assert_eq!(post.tags, vec!["Go", "go", "rust"]);
        assert_eq!(post.date, Utc.ymd(2020, 1, 1).and_hms(12, 0, 0));
        assert_eq!(post.body, "Hi *there*.\n");
        assert_eq!(post.html, "<p>Hi <em>there</em>.</p>\n");
        assert_eq!(post.path.url, "/posts/hello-world-202001011200/");
        assert_eq!(post.lang, "en,en-GB");
    }

    #[test]
    fn test_title_falls_back_to_file_name() {
        let post = Post::parse(Path::new("posts/untitled.md"), "just a body", &defaults(), Layout::Flat)
            .unwrap();
        assert_eq!(post.title, "untitled.md");
        assert_eq!(post.tags, vec!["Misc"]);
        assert_eq!(post.body, "just a body");
    }

    #[test]
    fn test_malformed_header_is_fatal() {
        let err = Post::parse(Path::new("posts/bad.md"), "oops\n$endmeta\n", &defaults(), Layout::Flat)
            .unwrap_err();
        assert!(matches!(err, Error::Metadata { .. }));
        assert_eq!(err.to_string(), "parsing post `posts/bad.md`");
    }

    #[test]
    fn test_unparseable_postdate_uses_now() {
        let before = Utc::now();
        let post = Post::parse(
            Path::new("posts/late.md"),
            "postdate: not-a-date\n$endmeta\n",
            &defaults(),
            Layout::Flat,
        )
        .unwrap();
        let after = Utc::now();
        assert!(before <= post.date && post.date <= after);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Post::load(&dir.path().join("nope.md"), &defaults(), Layout::Flat).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
