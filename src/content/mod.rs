//! Content module - discovery, front-matter, posts and markdown conversion

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::{parse_date, FrontMatter};
pub use markdown::MarkdownRenderer;
pub use post::{recent_first, ContentClass, Item, Page, Post};
