//! Defines the [`ContentGraph`], the many-to-many association between
//! [`Tag`]s and [`Post`]s, and the [`Tag`] type itself. Tag identity is
//! case-insensitive: `Go` and `go` are the same tag, displayed with whichever
//! casing the graph saw first.

use crate::post::Post;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

/// Identifies a post registered with a [`ContentGraph`]. Only meaningful for
/// the graph that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(usize);

/// Identifies a tag owned by a [`ContentGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(usize);

/// A case-insensitive post label.
#[derive(Clone, Debug)]
pub struct Tag {
    name: String,
    key: String,
}

impl Tag {
    pub fn new(name: &str) -> Tag {
        Tag {
            name: name.to_owned(),
            key: key(name),
        }
    }

    /// The display name: the casing of the first occurrence.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lowercased name that identifies the tag.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The tag's directory name under `deploy/tags/`: the key with path
    /// separators replaced by hyphens. Names made only of dots (`.`, `..`)
    /// have every dot replaced too, so they stay inside `deploy/tags/`.
    pub fn dir_name(&self) -> String {
        if self.key.chars().all(|c| c == '.') {
            return self.key.replace('.', "-");
        }
        self.key.replace(|c: char| c == '/' || c == '\\', "-")
    }

    /// The site-absolute URL of the tag page.
    pub fn url(&self) -> String {
        format!("/tags/{}/", self.dir_name())
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating to the lowercased key.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by comparing the
    /// lowercased keys, so `Go == go`.
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for Tag {}

impl AsRef<Tag> for Tag {
    fn as_ref(&self) -> &Tag {
        self
    }
}

/// Folds `name` for comparison: trimmed, lowercased, and with the Greek
/// final sigma mapped to `σ` so `ΟΔΟΣ` and `οδος` match.
fn key(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == 'ς' { 'σ' } else { c })
        .collect()
}

/// An edge between one tag and one post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    pub tag: TagId,
    pub post: PostId,
}

/// A post as seen through the graph: its id alongside the post itself.
#[derive(Clone, Copy, Debug)]
pub struct PostRef<'a> {
    pub id: PostId,
    pub post: &'a Post,
}

impl AsRef<Post> for PostRef<'_> {
    fn as_ref(&self) -> &Post {
        self.post
    }
}

/// Records which tags apply to which posts. The graph owns its tags and
/// edges and borrows the posts, which stay owned by whoever loaded them.
/// Mutation takes `&mut self`, so there is only ever one writer.
#[derive(Debug, Default)]
pub struct ContentGraph<'a> {
    posts: Vec<&'a Post>,
    tags: Vec<Tag>,
    tag_ids: HashMap<String, TagId>,
    connections: Vec<Connection>,
    edges: HashSet<Connection>,
    posts_by_tag: Vec<Vec<PostId>>,
    tags_by_post: Vec<Vec<TagId>>,
}

impl<'a> ContentGraph<'a> {
    pub fn new() -> ContentGraph<'a> {
        ContentGraph::default()
    }

    /// Builds a graph holding every post in `posts`, associated with each of
    /// its tag names.
    pub fn from_posts(posts: &'a [Post]) -> ContentGraph<'a> {
        let mut graph = ContentGraph::new();
        for post in posts {
            let id = graph.add_post(post);
            for name in &post.tags {
                graph.associate(name, id);
            }
        }
        graph
    }

    /// Registers a post. Posts need not have any tags.
    pub fn add_post(&mut self, post: &'a Post) -> PostId {
        let id = PostId(self.posts.len());
        self.posts.push(post);
        self.tags_by_post.push(Vec::new());
        id
    }

    /// Links the tag called `name` (created on first use) to `post`.
    /// Associating the same pair twice, in any casing, does nothing. Returns
    /// `None` for a blank name.
    pub fn associate(&mut self, name: &str, post: PostId) -> Option<TagId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let tag = match self.tag_ids.get(&key(name)) {
            Some(&tag) => tag,
            None => {
                let tag = TagId(self.tags.len());
                let created = Tag::new(name);
                self.tag_ids.insert(created.key.clone(), tag);
                self.tags.push(created);
                self.posts_by_tag.push(Vec::new());
                tag
            }
        };

        let connection = Connection { tag, post };
        if self.edges.insert(connection) {
            self.connections.push(connection);
            self.posts_by_tag[tag.0].push(post);
            self.tags_by_post[post.0].push(tag);
        }
        Some(tag)
    }

    /// Looks up a tag by name, ignoring case.
    pub fn find_tag(&self, name: &str) -> Option<TagId> {
        self.tag_ids.get(&key(name)).copied()
    }

    pub fn tag(&self, id: TagId) -> &Tag {
        &self.tags[id.0]
    }

    pub fn post(&self, id: PostId) -> &'a Post {
        self.posts[id.0]
    }

    /// All tags, in the order they were first seen.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// All posts, in registration order.
    pub fn posts(&self) -> impl Iterator<Item = PostRef<'a>> + '_ {
        self.posts
            .iter()
            .enumerate()
            .map(|(i, &post)| PostRef { id: PostId(i), post })
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// The posts tagged `name` (case-insensitive), in association order.
    /// Unknown tags have no posts.
    pub fn posts_for_tag(&self, name: &str) -> Vec<&'a Post> {
        self.refs_for_tag(name).into_iter().map(|r| r.post).collect()
    }

    /// Like [`ContentGraph::posts_for_tag`], keeping the post ids.
    pub fn refs_for_tag(&self, name: &str) -> Vec<PostRef<'a>> {
        match self.find_tag(name) {
            Some(tag) => self.posts_by_tag[tag.0]
                .iter()
                .map(|&id| PostRef {
                    id,
                    post: self.post(id),
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// The distinct tags of `post`, in association order.
    pub fn tags_for_post(&self, post: PostId) -> Vec<&Tag> {
        self.tags_by_post[post.0]
            .iter()
            .map(|&tag| self.tag(tag))
            .collect()
    }

    /// The number of distinct posts tagged `name` (case-insensitive).
    pub fn post_count(&self, name: &str) -> usize {
        self.find_tag(name)
            .map(|tag| self.posts_by_tag[tag.0].len())
            .unwrap_or(0)
    }
}
