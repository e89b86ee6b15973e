//! The rendering seam. The build only talks to the [`Renderer`] trait; the
//! [`Templates`] implementation loads a directory of `gtmpl` templates and
//! executes them by file name.
//!
//! Files in the templates directory whose name starts with `_` are partials:
//! their text is prepended to every page template, so `{{define}}` blocks
//! written there can be used from any page.

use gtmpl::{Context, Template, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Executes a named template against a page view-model.
pub trait Renderer {
    /// Renders `page` with the template called `template`, writing the result
    /// into `w`.
    fn render(&self, template: &str, page: &Value, w: &mut dyn Write) -> Result<()>;
}

/// A set of parsed page templates, keyed by file name.
pub struct Templates {
    pages: BTreeMap<String, Template>,
}

impl Templates {
    /// Loads and parses every template file in `dir`.
    pub fn load(dir: &Path) -> Result<Templates> {
        let mut sources = Vec::new();
        let entries = fs::read_dir(dir).map_err(|err| Error::Read {
            path: dir.to_owned(),
            err,
        })?;
        for entry in entries {
            let entry = entry.map_err(|err| Error::Read {
                path: dir.to_owned(),
                err,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|err| Error::Read {
                path: path.clone(),
                err,
            })?;
            sources.push((entry.file_name().to_string_lossy().into_owned(), text));
        }
        Templates::parse(sources)
    }

    /// Parses templates from `(file name, text)` pairs.
    pub fn parse<I>(sources: I) -> Result<Templates>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut partials = BTreeMap::new();
        let mut pages = BTreeMap::new();
        for (name, text) in sources {
            if name.starts_with('_') {
                partials.insert(name, text);
            } else {
                pages.insert(name, text);
            }
        }

        let mut prelude = String::new();
        for text in partials.values() {
            prelude.push_str(text.trim_end());
        }

        let mut parsed = BTreeMap::new();
        for (name, text) in pages {
            let mut template = Template::default();
            template
                .parse(format!("{}{}", prelude, text))
                .map_err(|message| Error::Parse {
                    name: name.clone(),
                    message,
                })?;
            parsed.insert(name, template);
        }
        Ok(Templates { pages: parsed })
    }

    /// The names of all page templates.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }
}

impl Renderer for Templates {
    fn render(&self, template: &str, page: &Value, mut w: &mut dyn Write) -> Result<()> {
        let tmpl = self
            .pages
            .get(template)
            .ok_or_else(|| Error::Missing(template.to_owned()))?;
        let context = Context::from(page.clone()).map_err(|message| Error::Execute {
            name: template.to_owned(),
            message,
        })?;
        tmpl.execute(&mut w, &context)
            .map_err(|message| Error::Execute {
                name: template.to_owned(),
                message,
            })
    }
}

/// Minifies rendered HTML. Debug builds get the markup unchanged.
pub fn minify(html: &[u8], debug: bool) -> Cow<'_, [u8]> {
    if debug {
        return Cow::Borrowed(html);
    }
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.minify_css = true;
    cfg.minify_js = true;
    Cow::Owned(minify_html::minify(html, &cfg))
}

/// The result of a rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a template that couldn't be loaded or executed.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a template file or directory can't be read.
    #[error("reading template `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when a template fails to parse.
    #[error("parsing template `{name}`: {message}")]
    Parse { name: String, message: String },

    /// Returned when no template has the requested name.
    #[error("no template named `{0}`")]
    Missing(String),

    /// Returned when executing a template fails.
    #[error("executing template `{name}`: {message}")]
    Execute { name: String, message: String },
}
