//! The library code for the `sitebuild` static blog generator. A build turns a
//! site root laid out as
//!
//! ```text
//! index.md        front page
//! posts/          markdown posts, any depth
//! static/         copied verbatim
//! templates/      gtmpl page templates
//! ```
//!
//! into a `deploy/` directory. The architecture breaks down into a few
//! steps, each in its own module:
//!
//! 1. Resolving the configuration and validating the root ([`crate::config`])
//! 2. Parsing posts from source files on disk ([`crate::discover`],
//!    [`crate::post`], [`crate::metadata`])
//! 3. Indexing posts by tag ([`crate::graph`])
//! 4. Building page view-models from sorted listings ([`crate::order`],
//!    [`crate::page`])
//! 5. Rendering every page to disk and copying static files
//!    ([`crate::render`], [`crate::build`])

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod discover;
pub mod graph;
pub mod markdown;
pub mod metadata;
pub mod order;
pub mod page;
pub mod post;
pub mod render;
pub mod slug;
