//! Template application using the Tera template engine
//!
//! Templates are loaded from `templates/*` under the site root and are
//! addressed by identifier, e.g. `templates/default.html`. Rendering is a
//! pure substitution over a [`tera::Context`]; a placeholder missing from the
//! context is an error that propagates to the caller.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::Write;
use tera::{Context, Tera};

use crate::content::{ContentClass, Item, Page, Post};
use crate::error::{Error, Result};

/// Site-wide wrapper applied last to every page
pub const DEFAULT_TEMPLATE: &str = "templates/default.html";

/// Wrapper for a single post body
pub const POST_TEMPLATE: &str = "templates/post.html";

/// List template for the article index
pub const ARCHIVE_TEMPLATE: &str = "templates/archive.html";

/// Fields computed by the generator; metadata never overrides them
const RESERVED_FIELDS: &[&str] = &["title", "date", "url", "path", "body", "posts"];

/// Loaded templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a renderer with no templates
    pub fn new() -> Self {
        let mut tera = Tera::default();
        // Bodies are already HTML
        tera.autoescape_on(vec![]);
        Self { tera }
    }

    /// Compile every template item
    pub fn load(items: &[Item]) -> Result<Self> {
        let mut renderer = Self::new();
        let mut sources = Vec::new();
        for item in items.iter().filter(|i| i.class == ContentClass::Template) {
            sources.push((item.identifier.as_str(), item.text()?));
        }

        renderer
            .tera
            .add_raw_templates(sources)
            .map_err(|source| Error::Template {
                name: "templates/*".to_string(),
                source,
            })?;

        tracing::debug!("Loaded {} templates", renderer.names().len());
        Ok(renderer)
    }

    /// Whether a template with this name is loaded
    pub fn has(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Names of all loaded templates, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tera.get_template_names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Apply a loaded template to a context
    pub fn apply(&self, name: &str, context: &Context) -> Result<String> {
        if !self.has(name) {
            return Err(Error::MissingTemplate {
                name: name.to_string(),
            });
        }
        self.tera
            .render(name, context)
            .map_err(|source| Error::Template {
                name: name.to_string(),
                source,
            })
    }

    /// Apply `name`, binding `body` in the context to the current content first
    pub fn apply_with_body(&self, name: &str, context: &Context, body: &str) -> Result<String> {
        let mut context = context.clone();
        context.insert("body", body);
        self.apply(name, &context)
    }

    /// Treat an item's own text as a template and apply it
    pub fn apply_as_template(&self, name: &str, source: &str, context: &Context) -> Result<String> {
        let mut tera = self.tera.clone();
        tera.add_raw_template(name, source)
            .and_then(|_| tera.render(name, context))
            .map_err(|source| Error::Template {
                name: name.to_string(),
                source,
            })
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a date with a strftime pattern, `None` if the pattern is invalid
pub fn format_date(date: &NaiveDateTime, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format)).ok()?;
    Some(out)
}

/// Template-facing view of a post
#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    pub date: String,
    pub url: String,
    pub path: String,
    pub body: String,
    /// Remaining front-matter fields
    #[serde(flatten)]
    pub extra: IndexMap<String, String>,
}

impl PostData {
    /// Build the view of a post; `date_format` must already be validated
    pub fn from_post(post: &Post, date_format: &str) -> Self {
        Self {
            title: post.title.clone(),
            date: format_date(&post.date, date_format).unwrap_or_default(),
            url: post.url(),
            path: post.identifier.clone(),
            body: post.content.clone(),
            extra: extra_fields(post.metadata.iter()),
        }
    }

    /// Context for rendering this post's own page
    pub fn to_context(&self) -> Context {
        let mut context = Context::new();
        for (key, value) in &self.extra {
            context.insert(key.as_str(), value);
        }
        context.insert("title", &self.title);
        context.insert("date", &self.date);
        context.insert("url", &self.url);
        context.insert("path", &self.path);
        context.insert("body", &self.body);
        context
    }
}

/// Context for a standalone page
pub fn page_context(page: &Page) -> Context {
    let mut context = Context::new();
    for (key, value) in extra_fields(page.metadata.iter()) {
        context.insert(key, &value);
    }
    context.insert("title", &page.title);
    context.insert("url", &page.url());
    context.insert("path", &page.identifier);
    context.insert("body", &page.content);
    context
}

/// Context for a page that lists posts
pub fn list_context(title: &str, route: &str, path: &str, posts: &[PostData]) -> Context {
    let mut context = Context::new();
    context.insert("posts", posts);
    context.insert("title", title);
    context.insert("url", &format!("/{}", route));
    context.insert("path", path);
    context.insert("body", "");
    context
}

fn extra_fields<'a>(fields: impl Iterator<Item = (&'a str, &'a str)>) -> IndexMap<String, String> {
    fields
        .filter(|(key, _)| !RESERVED_FIELDS.contains(key))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
