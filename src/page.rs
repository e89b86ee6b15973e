//! Builds the template view-models for every kind of page. Each builder
//! returns a [`Value::Object`] whose fields are documented on the builder;
//! all pages share the fields set by [`Page::to_object`].

use crate::config::Defaults;
use crate::graph::{ContentGraph, PostRef, Tag};
use crate::post::Post;
use chrono::{DateTime, Utc};
use gtmpl::Value;
use std::collections::HashMap;

/// The date format for page headers.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// The date format for post listings.
pub const LISTING_DATE_FORMAT: &str = "%Y-%m-%d";

type Object = HashMap<String, Value>;

/// The fields every page carries.
#[derive(Clone, Debug)]
pub struct Page {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub lang: String,
    pub dir: String,
    pub date: Option<DateTime<Utc>>,
}

impl Page {
    /// A page with the build defaults and no title or date.
    pub fn new(defaults: &Defaults) -> Page {
        Page {
            title: String::new(),
            description: String::new(),
            keywords: defaults.keywords.clone(),
            lang: defaults.lang.clone(),
            dir: defaults.dir.clone(),
            date: None,
        }
    }

    /// A page describing `post`.
    pub fn for_post(post: &Post) -> Page {
        Page {
            title: post.title.clone(),
            description: post.description.clone(),
            keywords: post.keywords.clone(),
            lang: post.lang.clone(),
            dir: post.dir.clone(),
            date: Some(post.date),
        }
    }

    fn titled(defaults: &Defaults, title: String, description: String, keywords: &str) -> Page {
        let mut page = Page::new(defaults);
        page.title = title;
        page.description = description;
        page.keywords = crate::metadata::split_list(keywords);
        page
    }

    /// Sets `title`, `has_title`, `description`, `has_description`,
    /// `keywords` (comma-joined), `has_keywords`, `lang`, `dir`, `date`, and
    /// `has_date`.
    fn to_object(&self) -> Object {
        let mut m = Object::new();
        m.insert("title".to_owned(), Value::from(self.title.as_str()));
        m.insert("has_title".to_owned(), Value::Bool(!self.title.is_empty()));
        m.insert("description".to_owned(), Value::from(self.description.as_str()));
        m.insert(
            "has_description".to_owned(),
            Value::Bool(!self.description.is_empty()),
        );
        m.insert("keywords".to_owned(), Value::from(self.keywords.join(", ")));
        m.insert("has_keywords".to_owned(), Value::Bool(!self.keywords.is_empty()));
        m.insert("lang".to_owned(), Value::from(self.lang.as_str()));
        m.insert("dir".to_owned(), Value::from(self.dir.as_str()));
        m.insert(
            "date".to_owned(),
            match &self.date {
                Some(date) => Value::from(date.format(DATE_FORMAT).to_string()),
                None => Value::from(""),
            },
        );
        m.insert("has_date".to_owned(), Value::Bool(self.date.is_some()));
        m
    }
}

/// Converts a tag into `{name, path, post_count}`.
fn tag_value(tag: &Tag, graph: &ContentGraph) -> Value {
    let mut m = Object::new();
    m.insert("name".to_owned(), Value::from(tag.name()));
    m.insert("path".to_owned(), Value::from(tag.url()));
    m.insert(
        "post_count".to_owned(),
        Value::from(graph.post_count(tag.name()) as i64),
    );
    Value::Object(m)
}

fn tags_value(tags: &[&Tag], graph: &ContentGraph) -> Value {
    Value::Array(tags.iter().map(|tag| tag_value(tag, graph)).collect())
}

/// Converts a post into a listing entry: `title`, `description`, `date`,
/// `path`, `tags`, and `has_tags`.
fn entry(post: PostRef, graph: &ContentGraph) -> Value {
    let tags = graph.tags_for_post(post.id);
    let mut m = Object::new();
    m.insert("title".to_owned(), Value::from(post.post.title.as_str()));
    m.insert(
        "description".to_owned(),
        Value::from(post.post.description.as_str()),
    );
    m.insert(
        "date".to_owned(),
        Value::from(post.post.date.format(LISTING_DATE_FORMAT).to_string()),
    );
    m.insert("path".to_owned(), Value::from(post.post.path.url.as_str()));
    m.insert("has_tags".to_owned(), Value::Bool(!tags.is_empty()));
    m.insert("tags".to_owned(), tags_value(&tags, graph));
    Value::Object(m)
}

fn entries(posts: &[PostRef], graph: &ContentGraph) -> Value {
    Value::Array(posts.iter().map(|&post| entry(post, graph)).collect())
}

fn post_object(post: &Post) -> Object {
    let mut m = Page::for_post(post).to_object();
    m.insert("content".to_owned(), Value::from(post.html.as_str()));
    m.insert(
        "author".to_owned(),
        Value::from(post.author.as_deref().unwrap_or("")),
    );
    m.insert("has_author".to_owned(), Value::Bool(post.author.is_some()));
    m.insert("path".to_owned(), Value::from(post.path.url.as_str()));
    m
}

/// The page for a single post: the common fields plus `content`, `author`,
/// `has_author`, `path`, `tags`, and `has_tags`. `tags` should come from
/// [`ContentGraph::tags_for_post`].
pub fn post_page(post: &Post, tags: &[&Tag], graph: &ContentGraph) -> Value {
    let mut m = post_object(post);
    m.insert("has_tags".to_owned(), Value::Bool(!tags.is_empty()));
    m.insert("tags".to_owned(), tags_value(tags, graph));
    Value::Object(m)
}

/// The front page: a post page without tags.
pub fn front_page(post: &Post) -> Value {
    let mut m = post_object(post);
    m.insert("has_tags".to_owned(), Value::Bool(false));
    m.insert("tags".to_owned(), Value::Array(Vec::new()));
    Value::Object(m)
}

/// The listing for one tag: the common fields plus `tag` (see
/// [`tag_value`]) and `posts`. `posts` must already be sorted.
pub fn tag_page(tag: &Tag, posts: &[PostRef], graph: &ContentGraph, defaults: &Defaults) -> Value {
    let page = Page::titled(
        defaults,
        format!("Posts in tag: {}", tag.name()),
        format!("Listing of posts in tag: {}", tag.name()),
        &format!("{}, tags, archive, posts, history", tag.name()),
    );
    let mut m = page.to_object();
    m.insert("tag".to_owned(), tag_value(tag, graph));
    m.insert("posts".to_owned(), entries(posts, graph));
    Value::Object(m)
}

/// The tag index: the common fields plus `tags`. `tags` must already be
/// sorted.
pub fn tag_index(tags: &[&Tag], graph: &ContentGraph, defaults: &Defaults) -> Value {
    let page = Page::titled(
        defaults,
        String::from("Listing of tags"),
        String::from("Listing of tags"),
        "tags, posts, archive, history, index",
    );
    let mut m = page.to_object();
    m.insert("tags".to_owned(), tags_value(tags, graph));
    Value::Object(m)
}

/// The post index: the common fields plus `posts` (all posts) and `years`
/// (`[{year, posts}]`). Both must already be sorted.
pub fn post_index(
    posts: &[PostRef],
    years: &[(i32, Vec<PostRef>)],
    graph: &ContentGraph,
    defaults: &Defaults,
) -> Value {
    let page = Page::titled(
        defaults,
        String::from("Listing of posts"),
        String::from("Listing of posts"),
        "posts, archive, history, index",
    );
    let mut m = page.to_object();
    m.insert("posts".to_owned(), entries(posts, graph));
    m.insert(
        "years".to_owned(),
        Value::Array(
            years
                .iter()
                .map(|(year, posts)| {
                    let mut y = Object::new();
                    y.insert("year".to_owned(), Value::from(*year as i64));
                    y.insert("posts".to_owned(), entries(posts, graph));
                    Value::Object(y)
                })
                .collect(),
        ),
    );
    Value::Object(m)
}
