//! Exports [`build_site`], which stitches together the high-level steps of
//! building the output site: loading posts ([`crate::discover`]), indexing
//! them by tag ([`crate::graph`]), turning the index into an ordered list of
//! [`RenderRequest`]s ([`SiteBuilder::requests`]), rendering those to disk,
//! and mirroring the static directory.
//!
//! Any error aborts the build at once. Files already written stay where they
//! are; the deploy directory is only cleaned at the start of the next build.

use crate::config::{self, Config};
use crate::discover;
use crate::graph::{ContentGraph, PostRef, Tag};
use crate::order::{self, date_descending, name_ascending};
use crate::page;
use crate::post::{self, Post};
use crate::render::{self, minify, Renderer, Templates};
use gtmpl::Value;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

pub const POST_TEMPLATE: &str = "post.html";
pub const TAG_TEMPLATE: &str = "tag.html";
pub const TAG_INDEX_TEMPLATE: &str = "tagindex.html";
pub const POST_INDEX_TEMPLATE: &str = "postindex.html";
pub const FRONT_PAGE_TEMPLATE: &str = "index.html";

/// The directory, below deploy, holding tag pages.
pub const TAGS_DIRECTORY: &str = "tags";

/// The file name every directory-style page is written to.
pub const INDEX_FILE: &str = "index.html";

/// One page to render: which template, which view-model, and where the
/// output goes (relative to the deploy directory).
pub struct RenderRequest {
    pub template: &'static str,
    pub output: PathBuf,
    pub page: Value,
}

/// Counts of what a build produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub posts: usize,
    pub tags: usize,
    pub pages: usize,
    pub static_files: usize,
}

/// Builds the site described by `config`: cleans the deploy directory, loads
/// the templates, renders every page, and copies static assets.
pub fn build_site(config: &Config) -> Result<BuildSummary> {
    config.prepare_deploy()?;
    let templates = Templates::load(&config.templates_directory())?;
    let builder = SiteBuilder::new(config);
    let mut summary = builder.build(&templates)?;
    summary.static_files = copy_static(&config.static_directory(), &config.deploy_directory())?;
    info!(
        posts = summary.posts,
        tags = summary.tags,
        pages = summary.pages,
        static_files = summary.static_files,
        "site built"
    );
    Ok(summary)
}

/// Orchestrates the page-generation pipeline for one site.
pub struct SiteBuilder<'c> {
    config: &'c Config,
}

impl<'c> SiteBuilder<'c> {
    pub fn new(config: &'c Config) -> SiteBuilder<'c> {
        SiteBuilder { config }
    }

    /// Loads every post, the front page, and renders them all with
    /// `renderer`. Does not touch the static directory.
    pub fn build<R: Renderer + ?Sized>(&self, renderer: &R) -> Result<BuildSummary> {
        let posts = discover::load_posts(self.config)?;
        info!(count = posts.len(), "loaded posts");

        let front = Post::load(
            &self.config.front_page(),
            &self.config.defaults,
            self.config.layout,
        )?;

        let graph = ContentGraph::from_posts(&posts);
        let requests = self.requests(&graph, &front);
        let pages = self.write(&requests, renderer)?;

        Ok(BuildSummary {
            posts: posts.len(),
            tags: graph.tags().len(),
            pages,
            static_files: 0,
        })
    }

    /// Produces every render request, in order: one per post, one per tag,
    /// the tag index, the post index, and finally the front page. Every
    /// listing is sorted here.
    pub fn requests(&self, graph: &ContentGraph, front: &Post) -> Vec<RenderRequest> {
        let defaults = &self.config.defaults;
        let mut requests = Vec::with_capacity(graph.tags().len() * 2 + 3);

        let mut posts: Vec<PostRef> = graph.posts().collect();
        order::sort(&mut posts, date_descending);
        for post in &posts {
            requests.push(RenderRequest {
                template: POST_TEMPLATE,
                output: Path::new(config::POSTS_DIRECTORY).join(&post.post.path.file),
                page: page::post_page(post.post, &graph.tags_for_post(post.id), graph),
            });
        }

        let mut tags: Vec<&Tag> = graph.tags().iter().collect();
        order::sort(&mut tags, name_ascending);
        for tag in &tags {
            let mut tagged = graph.refs_for_tag(tag.name());
            order::sort(&mut tagged, date_descending);
            requests.push(RenderRequest {
                template: TAG_TEMPLATE,
                output: Path::new(TAGS_DIRECTORY).join(tag.dir_name()).join(INDEX_FILE),
                page: page::tag_page(tag, &tagged, graph, defaults),
            });
        }

        requests.push(RenderRequest {
            template: TAG_INDEX_TEMPLATE,
            output: Path::new(TAGS_DIRECTORY).join(INDEX_FILE),
            page: page::tag_index(&tags, graph, defaults),
        });

        let years = order::group_by_year(posts.clone());
        requests.push(RenderRequest {
            template: POST_INDEX_TEMPLATE,
            output: Path::new(config::POSTS_DIRECTORY).join(INDEX_FILE),
            page: page::post_index(&posts, &years, graph, defaults),
        });

        requests.push(RenderRequest {
            template: FRONT_PAGE_TEMPLATE,
            output: PathBuf::from(INDEX_FILE),
            page: page::front_page(front),
        });

        requests
    }

    /// Renders each request and writes it below the deploy directory,
    /// returning the number of pages written.
    pub fn write<R: Renderer + ?Sized>(
        &self,
        requests: &[RenderRequest],
        renderer: &R,
    ) -> Result<usize> {
        let deploy = self.config.deploy_directory();
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let mut buf = Vec::new();

        for request in requests {
            let path = deploy.join(&request.output);
            buf.clear();
            renderer
                .render(request.template, &request.page, &mut buf)
                .map_err(|err| Error::Render {
                    path: path.clone(),
                    err,
                })?;

            if let Some(dir) = path.parent() {
                if seen_dirs.insert(dir.to_owned()) {
                    fs::create_dir_all(dir).map_err(|err| Error::Write {
                        path: dir.to_owned(),
                        err,
                    })?;
                }
            }
            fs::write(&path, minify(&buf, self.config.debug)).map_err(|err| Error::Write {
                path: path.clone(),
                err,
            })?;
            debug!(path = %path.display(), template = request.template, "wrote page");
        }

        info!(count = requests.len(), "rendered pages");
        Ok(requests.len())
    }
}

/// Mirrors `src` into `dst` byte for byte, returning the number of files
/// copied.
pub fn copy_static(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for result in WalkDir::new(src).follow_links(true) {
        let entry = result?;
        // strip_prefix can't fail: every entry is below `src`
        let relative = entry.path().strip_prefix(src).unwrap_or_else(|_| entry.path());
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|err| Error::Write {
                path: target.clone(),
                err,
            })?;
        } else {
            fs::copy(entry.path(), &target).map_err(|err| Error::Copy {
                path: entry.path().to_owned(),
                err,
            })?;
            copied += 1;
        }
    }
    info!(count = copied, "copied static files");
    Ok(copied)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Every fatal condition in the pipeline
/// ends up here.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for an invalid site root or deploy directory problems.
    #[error(transparent)]
    Config(#[from] config::Error),

    /// Returned when posts can't be found or loaded.
    #[error(transparent)]
    Discover(#[from] discover::Error),

    /// Returned when the front page can't be loaded.
    #[error(transparent)]
    Post(#[from] post::Error),

    /// Returned when the templates can't be loaded.
    #[error(transparent)]
    Templates(#[from] render::Error),

    /// Returned when a page fails to render.
    #[error("rendering `{}`", .path.display())]
    Render {
        path: PathBuf,
        #[source]
        err: render::Error,
    },

    /// Returned when an output file or directory can't be written.
    #[error("writing `{}`", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when a static file can't be copied.
    #[error("copying static file `{}`", .path.display())]
    Copy {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when walking the static directory fails.
    #[error("walking static directory")]
    Static(#[from] walkdir::Error),
}
