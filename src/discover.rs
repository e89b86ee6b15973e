//! Finds post source documents on disk. [`PostSources`] is a lazy, finite
//! walk of the posts directory; re-create it to walk again. The order it
//! yields files in carries no meaning, so every listing built from its output
//! must be sorted explicitly (see [`crate::order`]).

use crate::config::Config;
use crate::post::{self, Post};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, FilterEntry, IntoIter, WalkDir};

/// Yields the path of every regular file below a directory, at any depth.
/// Hidden files and directories are skipped. The first walk error is yielded
/// and ends the iteration.
pub struct PostSources {
    walker: FilterEntry<IntoIter, fn(&DirEntry) -> bool>,
    done: bool,
}

impl PostSources {
    pub fn new(root: &Path) -> PostSources {
        PostSources {
            walker: WalkDir::new(root)
                .follow_links(true)
                .sort_by(|a, b| a.file_name().cmp(b.file_name()))
                .into_iter()
                .filter_entry(is_visible as fn(&DirEntry) -> bool),
            done: false,
        }
    }
}

impl Iterator for PostSources {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.walker.next()? {
                Ok(entry) if entry.file_type().is_file() => return Some(Ok(entry.into_path())),
                Ok(_) => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(Error::Walk(err)));
                }
            }
        }
    }
}

fn is_visible(entry: &DirEntry) -> bool {
    entry.depth() == 0
        || !entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Loads every post below the configured posts directory, stopping at the
/// first error.
pub fn load_posts(config: &Config) -> Result<Vec<Post>> {
    PostSources::new(&config.posts_directory())
        .map(|source| -> Result<Post> {
            Ok(Post::load(&source?, &config.defaults, config.layout)?)
        })
        .collect()
}

/// The result of a discovery operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error finding or loading posts.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when walking the posts directory fails.
    #[error("walking posts directory")]
    Walk(#[source] walkdir::Error),

    /// Returned when a post fails to load.
    #[error(transparent)]
    Post(#[from] post::Error),
}
