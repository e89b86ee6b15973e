//! Defines the build-wide [`Config`]: the site root, the per-field
//! [`Defaults`] that posts fall back to, and output options. Defaults are
//! resolved once from the built-in values, the optional `sitebuild.yaml` site
//! file, and command-line [`Overrides`] (in increasing order of precedence),
//! and are then passed by reference into the parsing stage.

use crate::metadata::split_list;
use crate::slug::Layout;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The name of the optional site configuration file in the site root.
pub const SITE_FILE: &str = "sitebuild.yaml";

/// Source documents, any nesting.
pub const POSTS_DIRECTORY: &str = "posts";

/// Assets mirrored verbatim into the deploy directory.
pub const STATIC_DIRECTORY: &str = "static";

/// Template files consumed by [`crate::render::Templates`].
pub const TEMPLATES_DIRECTORY: &str = "templates";

/// The output directory. Wiped at the start of every build.
pub const DEPLOY_DIRECTORY: &str = "deploy";

/// The front page source document.
pub const FRONT_PAGE: &str = "index.md";

/// The values a post falls back to for every metadata key it omits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Defaults {
    pub lang: String,
    pub dir: String,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            lang: String::from("en,en-GB"),
            dir: String::from("ltr"),
            tags: Vec::new(),
            keywords: Vec::new(),
        }
    }
}

/// Values supplied on the command line. Every `Some` field wins over the site
/// file and the built-in defaults.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub lang: Option<String>,
    pub dir: Option<String>,
    pub tags: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub layout: Option<Layout>,
    pub debug: bool,
}

/// A list in `sitebuild.yaml`, written either as a YAML sequence or as a
/// single comma-separated string.
#[derive(Deserialize)]
#[serde(untagged)]
enum List {
    Items(Vec<String>),
    Joined(String),
}

impl List {
    fn into_vec(self) -> Vec<String> {
        match self {
            List::Items(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect(),
            List::Joined(joined) => split_list(&joined),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SiteFile {
    #[serde(default)]
    lang: Option<String>,

    #[serde(default)]
    dir: Option<String>,

    #[serde(default)]
    tags: Option<List>,

    #[serde(default)]
    keywords: Option<List>,

    #[serde(default)]
    layout: Option<Layout>,
}

impl SiteFile {
    /// Reads `sitebuild.yaml` from `root`. A missing file is the same as an
    /// empty one.
    fn load(root: &Path) -> Result<SiteFile> {
        let path = root.join(SITE_FILE);
        let file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(SiteFile::default())
            }
            Err(err) => {
                return Err(Error::Io {
                    action: "opening site file",
                    path,
                    err,
                })
            }
        };
        serde_yaml::from_reader(file).map_err(|err| Error::SiteFile { path, err })
    }
}

/// Everything the build needs to know that doesn't come from the posts
/// themselves.
#[derive(Clone, Debug)]
pub struct Config {
    /// The absolute site root.
    pub root: PathBuf,

    /// Post field defaults, already merged from every source.
    pub defaults: Defaults,

    /// How post output paths are shaped.
    pub layout: Layout,

    /// Debug builds skip HTML minification.
    pub debug: bool,
}

impl Config {
    /// Validates `root` and resolves the build configuration for it. Fails
    /// before touching anything on disk if a required directory is missing.
    pub fn load(root: &Path, overrides: Overrides) -> Result<Config> {
        let root = absolute(root)?;
        validate(&root)?;
        let SiteFile {
            lang,
            dir,
            tags,
            keywords,
            layout,
        } = SiteFile::load(&root)?;

        let mut defaults = Defaults::default();
        if let Some(lang) = overrides.lang.or(lang) {
            defaults.lang = lang;
        }
        if let Some(dir) = overrides.dir.or(dir) {
            defaults.dir = dir;
        }
        if let Some(tags) = overrides.tags.or_else(|| tags.map(List::into_vec)) {
            defaults.tags = tags;
        }
        if let Some(keywords) = overrides
            .keywords
            .or_else(|| keywords.map(List::into_vec))
        {
            defaults.keywords = keywords;
        }

        Ok(Config {
            root,
            defaults,
            layout: overrides.layout.or(layout).unwrap_or_default(),
            debug: overrides.debug,
        })
    }

    pub fn posts_directory(&self) -> PathBuf {
        self.root.join(POSTS_DIRECTORY)
    }

    pub fn static_directory(&self) -> PathBuf {
        self.root.join(STATIC_DIRECTORY)
    }

    pub fn templates_directory(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIRECTORY)
    }

    pub fn deploy_directory(&self) -> PathBuf {
        self.root.join(DEPLOY_DIRECTORY)
    }

    pub fn front_page(&self) -> PathBuf {
        self.root.join(FRONT_PAGE)
    }

    /// Deletes any previous deploy directory and creates a fresh, empty one.
    pub fn prepare_deploy(&self) -> Result<()> {
        let deploy = self.deploy_directory();
        match std::fs::remove_dir_all(&deploy) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(Error::Io {
                    action: "cleaning deploy directory",
                    path: deploy,
                    err,
                })
            }
        }
        std::fs::create_dir_all(&deploy).map_err(|err| Error::Io {
            action: "creating deploy directory",
            path: deploy,
            err,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|err| Error::Io {
            action: "resolving working directory",
            path: path.to_owned(),
            err,
        })
}

/// Ensures `root` and its `posts`, `static`, and `templates` subdirectories
/// exist and are directories.
pub fn validate(root: &Path) -> Result<()> {
    validate_dir(root)?;
    for name in &[POSTS_DIRECTORY, STATIC_DIRECTORY, TEMPLATES_DIRECTORY] {
        validate_dir(&root.join(name))?;
    }
    Ok(())
}

fn validate_dir(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory(path.to_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::Missing(path.to_owned())),
        Err(err) => Err(Error::Io {
            action: "inspecting",
            path: path.to_owned(),
            err,
        }),
    }
}

/// The result of a configuration operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an invalid site root or an unreadable site file.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a required directory does not exist.
    #[error("required directory `{}` does not exist", .0.display())]
    Missing(PathBuf),

    /// Returned when a required path exists but is not a directory.
    #[error("`{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Returned when `sitebuild.yaml` is not valid.
    #[error("reading site file `{}`", .path.display())]
    SiteFile {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },

    /// Returned for other I/O problems.
    #[error("{action} `{}`", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}
