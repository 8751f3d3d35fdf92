//! Content items, posts and pages

use chrono::NaiveDateTime;
use glob::{MatchOptions, Pattern};
use lazy_static::lazy_static;
use std::cmp::Ordering;

use super::frontmatter::{parse_date, FrontMatter};
use super::MarkdownRenderer;
use crate::error::{Error, Result};
use crate::routes;

/// The fixed set of content classes the site is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentClass {
    Image,
    Stylesheet,
    ContactPage,
    Post,
    Template,
    IndexPage,
}

impl ContentClass {
    /// Every class, in the order they are matched
    pub const ALL: [ContentClass; 6] = [
        ContentClass::Image,
        ContentClass::Stylesheet,
        ContentClass::ContactPage,
        ContentClass::Post,
        ContentClass::Template,
        ContentClass::IndexPage,
    ];

    /// Glob pattern, relative to the site root, selecting this class
    pub fn pattern(self) -> &'static str {
        match self {
            ContentClass::Image => "images/*",
            ContentClass::Stylesheet => "css/*",
            ContentClass::ContactPage => "contact.markdown",
            ContentClass::Post => "posts/*",
            ContentClass::Template => "templates/*",
            ContentClass::IndexPage => "index.html",
        }
    }

    /// Find the class of an identifier; `None` means the file is not processed
    pub fn classify(identifier: &str) -> Option<Self> {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.matches_with(identifier, options))
            .map(|(class, _)| *class)
    }
}

lazy_static! {
    static ref PATTERNS: Vec<(ContentClass, Pattern)> = ContentClass::ALL
        .iter()
        .map(|class| {
            let pattern = Pattern::new(class.pattern()).expect("content patterns are valid globs");
            (*class, pattern)
        })
        .collect();
}

/// A discovered source file
#[derive(Debug, Clone)]
pub struct Item {
    /// Path relative to the site root, `/`-separated
    pub identifier: String,
    pub class: ContentClass,
    pub bytes: Vec<u8>,
}

impl Item {
    /// The item's content as UTF-8 text
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes).map_err(|_| Error::InvalidUtf8 {
            path: self.identifier.clone(),
        })
    }

    /// Output path, if this class is routed
    pub fn route(&self) -> Option<String> {
        routes::route(self.class, &self.identifier)
    }
}

/// A blog post
#[derive(Debug, Clone)]
pub struct Post {
    /// Source identifier, e.g. `posts/hello.markdown`
    pub identifier: String,

    /// Output path, e.g. `posts/hello.html`
    pub route: String,

    /// Post title (required)
    pub title: String,

    /// Publication date (required)
    pub date: NaiveDateTime,

    /// All front-matter fields, including title and date
    pub metadata: FrontMatter,

    /// Body converted to HTML, before any template
    pub content: String,
}

impl Post {
    /// Parse and convert a post item.
    ///
    /// Fails when the front-matter is malformed or lacks `title` or `date`.
    pub fn from_item(item: &Item, renderer: &MarkdownRenderer) -> Result<Self> {
        let path = item.identifier.as_str();
        let (metadata, body) = FrontMatter::parse(path, item.text()?)?;

        let title = metadata.require(path, "title")?.to_string();
        let date_value = metadata.require(path, "date")?;
        let date = parse_date(date_value).ok_or_else(|| Error::InvalidDate {
            path: path.to_string(),
            value: date_value.to_string(),
        })?;

        let route = item.route().unwrap_or_default();

        Ok(Self {
            identifier: item.identifier.clone(),
            route,
            title,
            date,
            content: renderer.render(body),
            metadata,
        })
    }

    /// Root-relative URL of the rendered post
    pub fn url(&self) -> String {
        format!("/{}", self.route)
    }
}

/// Order posts newest first; equal dates fall back to identifier, descending
pub fn recent_first(posts: &mut [Post]) {
    posts.sort_by(compare_recent_first);
}

fn compare_recent_first(a: &Post, b: &Post) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| b.identifier.cmp(&a.identifier))
}

/// A standalone markdown page (the contact page)
#[derive(Debug, Clone)]
pub struct Page {
    pub identifier: String,
    pub route: String,
    /// `title` from front-matter, or the file stem
    pub title: String,
    pub metadata: FrontMatter,
    /// Body converted to HTML, before any template
    pub content: String,
}

impl Page {
    /// Parse and convert a page item; front-matter is optional
    pub fn from_item(item: &Item, renderer: &MarkdownRenderer) -> Result<Self> {
        let path = item.identifier.as_str();
        let (metadata, body) = FrontMatter::parse(path, item.text()?)?;

        let title = metadata
            .get("title")
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(path).to_string());

        Ok(Self {
            identifier: item.identifier.clone(),
            route: item.route().unwrap_or_default(),
            title,
            content: renderer.render(body),
            metadata,
        })
    }

    /// Root-relative URL of the rendered page
    pub fn url(&self) -> String {
        format!("/{}", self.route)
    }
}

fn file_stem(identifier: &str) -> &str {
    let name = identifier.rsplit('/').next().unwrap_or(identifier);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}
