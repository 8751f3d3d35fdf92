//! Generator module - runs the content pipeline and writes the site

use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::cache::{CacheDb, Fingerprint};
use crate::content::loader::ContentLoader;
use crate::content::{recent_first, ContentClass, Item, MarkdownRenderer, Page, Post};
use crate::error::{report, Error, Result};
use crate::helpers::{css, relativize};
use crate::routes::{ARTICLES_ROUTE, INDEX_ROUTE};
use crate::templates::{
    list_context, page_context, PostData, TemplateRenderer, ARCHIVE_TEMPLATE, DEFAULT_TEMPLATE,
    POST_TEMPLATE,
};
use crate::Site;

/// Title bound on the article index
pub const ARTICLES_TITLE: &str = "Posts";

/// Title bound on the home page
pub const HOME_TITLE: &str = "Home";

/// What a build did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Outputs rendered and written
    pub written: Vec<String>,
    /// Outputs whose inputs were unchanged
    pub fresh: Vec<String>,
}

/// Static site generator
pub struct Generator<'a> {
    site: &'a Site,
    markdown: MarkdownRenderer,
}

/// Mutable state threaded through one build
struct BuildState {
    previous: CacheDb,
    current: CacheDb,
    summary: BuildSummary,
    failed: Vec<String>,
}

impl<'a> Generator<'a> {
    /// Create a new generator
    pub fn new(site: &'a Site) -> Self {
        Self {
            site,
            markdown: MarkdownRenderer::new(),
        }
    }

    /// Build the whole site.
    ///
    /// An item that fails is logged and skipped; every unrelated item is
    /// still written, and the run then reports [`Error::Build`]. The
    /// aggregate pages are only rendered when every post converted cleanly.
    pub fn generate(&self) -> Result<BuildSummary> {
        let start = Instant::now();

        let items = ContentLoader::new(self.site).discover()?;
        let templates = TemplateRenderer::load(&items)?;
        tracing::info!(
            "Discovered {} items, {} templates",
            items.len(),
            templates.names().len()
        );

        let templates_hash = self.templates_fingerprint(&items);
        let mut state = BuildState {
            previous: CacheDb::load(&self.site.store_dir),
            current: CacheDb::new(),
            summary: BuildSummary::default(),
            failed: Vec::new(),
        };

        let mut posts = Vec::new();
        let mut post_failures = 0;

        for item in &items {
            let result = match item.class {
                ContentClass::Image => self.copy_file(item, &mut state),
                ContentClass::Stylesheet => self.compress_stylesheet(item, &mut state),
                ContentClass::ContactPage => {
                    self.compile_page(item, &templates, templates_hash, &mut state)
                }
                ContentClass::Post => self
                    .compile_post(item, &templates, templates_hash, &mut state)
                    .map(|post| posts.push(post)),
                // Inputs only, or rendered once all posts are known
                ContentClass::Template | ContentClass::IndexPage => Ok(()),
            };

            if let Err(e) = result {
                tracing::error!("{}", report(&e));
                if item.class == ContentClass::Post {
                    post_failures += 1;
                }
                state.failed.push(item.identifier.clone());
            }
        }

        if post_failures > 0 {
            tracing::error!(
                "Skipping {} and {}: {} post(s) failed",
                ARTICLES_ROUTE,
                INDEX_ROUTE,
                post_failures
            );
        } else {
            recent_first(&mut posts);
            self.generate_aggregates(&items, &posts, &templates, templates_hash, &mut state);
        }

        state.current.save(&self.site.store_dir)?;

        tracing::info!(
            "Wrote {} files, {} up to date, in {:.2}s",
            state.summary.written.len(),
            state.summary.fresh.len(),
            start.elapsed().as_secs_f64()
        );

        if state.failed.is_empty() {
            Ok(state.summary)
        } else {
            Err(Error::Build(state.failed))
        }
    }

    /// Images are copied byte for byte
    fn copy_file(&self, item: &Item, state: &mut BuildState) -> Result<()> {
        let route = item.route().unwrap_or_else(|| item.identifier.clone());
        let fingerprint = Fingerprint::new("copy")
            .add(&item.identifier, &item.bytes)
            .finish();
        self.emit(state, &route, fingerprint, || Ok(item.bytes.clone()))
    }

    /// Stylesheets are minified
    fn compress_stylesheet(&self, item: &Item, state: &mut BuildState) -> Result<()> {
        let route = item.route().unwrap_or_else(|| item.identifier.clone());
        let fingerprint = Fingerprint::new("css")
            .add(&item.identifier, &item.bytes)
            .finish();
        self.emit(state, &route, fingerprint, || {
            Ok(css::compress(&item.identifier, item.text()?)?.into_bytes())
        })
    }

    /// Contact page: markdown, then the default template
    fn compile_page(
        &self,
        item: &Item,
        templates: &TemplateRenderer,
        templates_hash: u64,
        state: &mut BuildState,
    ) -> Result<()> {
        let page = Page::from_item(item, &self.markdown)?;
        let fingerprint = Fingerprint::new("page")
            .add(&item.identifier, &item.bytes)
            .add_hash(templates_hash)
            .finish();

        self.emit(state, &page.route, fingerprint, || {
            let context = page_context(&page);
            let html = templates.apply_with_body(DEFAULT_TEMPLATE, &context, &page.content)?;
            Ok(relativize(&html, &page.route).into_bytes())
        })
    }

    /// Posts: markdown, then the post template, then the default template
    fn compile_post(
        &self,
        item: &Item,
        templates: &TemplateRenderer,
        templates_hash: u64,
        state: &mut BuildState,
    ) -> Result<Post> {
        let post = Post::from_item(item, &self.markdown)?;
        let fingerprint = Fingerprint::new("post")
            .add(&item.identifier, &item.bytes)
            .add_hash(templates_hash)
            .finish();

        self.emit(state, &post.route, fingerprint, || {
            let data = PostData::from_post(&post, &self.site.config.date_format);
            let context = data.to_context();
            let html = templates.apply(POST_TEMPLATE, &context)?;
            let html = templates.apply_with_body(DEFAULT_TEMPLATE, &context, &html)?;
            Ok(relativize(&html, &post.route).into_bytes())
        })?;

        Ok(post)
    }

    /// The article index and the home page, from posts sorted newest first
    fn generate_aggregates(
        &self,
        items: &[Item],
        posts: &[Post],
        templates: &TemplateRenderer,
        templates_hash: u64,
        state: &mut BuildState,
    ) {
        let post_data: Vec<PostData> = posts
            .iter()
            .map(|p| PostData::from_post(p, &self.site.config.date_format))
            .collect();

        let posts_hash = items
            .iter()
            .filter(|i| i.class == ContentClass::Post)
            .fold(Fingerprint::new("posts"), |fp, i| {
                fp.add(&i.identifier, &i.bytes)
            })
            .add_hash(templates_hash)
            .finish();

        let articles = Fingerprint::new(ARTICLES_ROUTE).add_hash(posts_hash).finish();
        let result = self.emit(state, ARTICLES_ROUTE, articles, || {
            let context = list_context(ARTICLES_TITLE, ARTICLES_ROUTE, ARTICLES_ROUTE, &post_data);
            let html = templates.apply(ARCHIVE_TEMPLATE, &context)?;
            let html = templates.apply_with_body(DEFAULT_TEMPLATE, &context, &html)?;
            Ok(relativize(&html, ARTICLES_ROUTE).into_bytes())
        });
        if let Err(e) = result {
            tracing::error!("{}", report(&e));
            state.failed.push(ARTICLES_ROUTE.to_string());
        }

        let Some(index) = items.iter().find(|i| i.class == ContentClass::IndexPage) else {
            tracing::debug!("No index.html source, skipping home page");
            return;
        };

        let fingerprint = Fingerprint::new(INDEX_ROUTE)
            .add(&index.identifier, &index.bytes)
            .add_hash(posts_hash)
            .finish();
        let result = self.emit(state, INDEX_ROUTE, fingerprint, || {
            let context = list_context(HOME_TITLE, INDEX_ROUTE, &index.identifier, &post_data);
            let html = templates.apply_as_template(&index.identifier, index.text()?, &context)?;
            let html = templates.apply_with_body(DEFAULT_TEMPLATE, &context, &html)?;
            Ok(relativize(&html, INDEX_ROUTE).into_bytes())
        });
        if let Err(e) = result {
            tracing::error!("{}", report(&e));
            state.failed.push(index.identifier.clone());
        }
    }

    /// Render and write `route` unless it is already up to date
    fn emit<F>(&self, state: &mut BuildState, route: &str, fingerprint: u64, render: F) -> Result<()>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        let dest = self.site.destination_dir.join(route);

        if state.previous.is_fresh(route, fingerprint) && dest.is_file() {
            tracing::debug!("Up to date: {}", route);
            state.current.record(route, fingerprint);
            state.summary.fresh.push(route.to_string());
            return Ok(());
        }

        let bytes = render()?;
        write_file(&dest, &bytes)?;
        tracing::debug!("Generated: {:?}", dest);

        state.current.record(route, fingerprint);
        state.summary.written.push(route.to_string());
        Ok(())
    }

    /// Every template and the date format feed every rendered page
    fn templates_fingerprint(&self, items: &[Item]) -> u64 {
        items
            .iter()
            .filter(|i| i.class == ContentClass::Template)
            .fold(Fingerprint::new("templates"), |fp, i| {
                fp.add(&i.identifier, &i.bytes)
            })
            .add("date_format", self.site.config.date_format.as_bytes())
            .finish()
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEFAULT: &str = r#"<html><head><title>{{ title }}</title><link rel="stylesheet" href="/css/default.css"></head><body><nav><a href="/">Home</a> <a href="/articles.html">Posts</a></nav>{{ body }}</body></html>"#;
    const POST: &str = r#"<article><h1>{{ title }}</h1><p>{{ date }}</p>{{ body }}</article>"#;
    const ARCHIVE: &str = r#"<ul>{% for post in posts %}<li><a href="{{ post.url }}">{{ post.title }}</a> {{ post.date }}</li>{% endfor %}</ul>"#;
    const INDEX: &str = r#"<h2>Recent</h2>{% for post in posts %}<a href="{{ post.url }}">{{ post.title }}</a>{% endfor %}"#;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn post_source(title: &str, date: &str) -> String {
        format!(
            "---\ntitle: {}\ndate: {}\n---\n\nSee [contact](/contact.html).\n",
            title, date
        )
    }

    fn sample_site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "templates/default.html", DEFAULT.as_bytes());
        write(root, "templates/post.html", POST.as_bytes());
        write(root, "templates/archive.html", ARCHIVE.as_bytes());
        write(root, "index.html", INDEX.as_bytes());
        write(root, "images/logo.png", &[0x89, b'P', b'N', b'G', 0x00, 0xff]);
        write(root, "css/default.css", b"body {\n  margin: 0;\n}\n");
        write(root, "contact.markdown", b"---\ntitle: Contact\n---\n\nWrite to me.\n");
        write(
            root,
            "posts/year-end.markdown",
            post_source("Year End", "December 27, 2015").as_bytes(),
        );
        write(
            root,
            "posts/spring.markdown",
            post_source("Spring", "2015-04-01").as_bytes(),
        );
        write(root, "notes.txt", b"not part of the site");
        dir
    }

    fn read(site: &Site, route: &str) -> String {
        fs::read_to_string(site.destination_dir.join(route)).unwrap()
    }

    #[test]
    fn test_generate_full_site() {
        let dir = sample_site();
        let site = Site::new(dir.path()).unwrap();
        let summary = Generator::new(&site).generate().unwrap();

        let mut written = summary.written.clone();
        written.sort();
        assert_eq!(
            written,
            vec![
                "articles.html",
                "contact.html",
                "css/default.css",
                "images/logo.png",
                "index.html",
                "posts/spring.html",
                "posts/year-end.html",
            ]
        );
        assert!(!site.destination_dir.join("notes.txt").exists());
        assert!(!site.destination_dir.join("templates").exists());
    }

    #[test]
    fn test_images_copied_and_css_compressed() {
        let dir = sample_site();
        let site = Site::new(dir.path()).unwrap();
        Generator::new(&site).generate().unwrap();

        let logo = fs::read(site.destination_dir.join("images/logo.png")).unwrap();
        assert_eq!(logo, vec![0x89, b'P', b'N', b'G', 0x00, 0xff]);
        assert_eq!(read(&site, "css/default.css"), "body{margin:0}");
    }

    #[test]
    fn test_post_page_is_templated_and_relativized() {
        let dir = sample_site();
        let site = Site::new(dir.path()).unwrap();
        Generator::new(&site).generate().unwrap();

        let html = read(&site, "posts/year-end.html");
        assert!(html.contains("<title>Year End</title>"));
        assert!(html.contains("<h1>Year End</h1><p>December 27, 2015</p>"));
        assert!(html.contains(r#"href="../css/default.css""#));
        assert!(html.contains(r#"href="../articles.html""#));
        assert!(html.contains(r#"<a href="../contact.html">contact</a>"#));
    }

    #[test]
    fn test_contact_page_uses_default_template_only() {
        let dir = sample_site();
        let site = Site::new(dir.path()).unwrap();
        Generator::new(&site).generate().unwrap();

        let html = read(&site, "contact.html");
        assert!(html.contains("<title>Contact</title>"));
        assert!(html.contains("<p>Write to me.</p>"));
        assert!(!html.contains("<article>"));
        assert!(html.contains(r#"href="./css/default.css""#));
    }

    #[test]
    fn test_articles_newest_first() {
        let dir = sample_site();
        let site = Site::new(dir.path()).unwrap();
        Generator::new(&site).generate().unwrap();

        let html = read(&site, "articles.html");
        assert!(html.contains("<title>Posts</title>"));
        let newest = html.find("Year End").unwrap();
        let older = html.find("Spring").unwrap();
        assert!(newest < older);
        assert!(html.contains(r#"<a href="./posts/year-end.html">Year End</a> December 27, 2015"#));
    }

    #[test]
    fn test_index_is_self_templated() {
        let dir = sample_site();
        let site = Site::new(dir.path()).unwrap();
        Generator::new(&site).generate().unwrap();

        let html = read(&site, "index.html");
        assert!(html.contains("<title>Home</title>"));
        assert!(html.contains(
            r#"<h2>Recent</h2><a href="./posts/year-end.html">Year End</a><a href="./posts/spring.html">Spring</a>"#
        ));
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let dir = sample_site();
        let site = Site::new(dir.path()).unwrap();
        Generator::new(&site).generate().unwrap();
        let first: Vec<_> = ["index.html", "articles.html", "posts/spring.html"]
            .iter()
            .map(|r| read(&site, r))
            .collect();

        fs::remove_dir_all(&site.destination_dir).unwrap();
        fs::remove_dir_all(&site.store_dir).unwrap();
        Generator::new(&site).generate().unwrap();
        let second: Vec<_> = ["index.html", "articles.html", "posts/spring.html"]
            .iter()
            .map(|r| read(&site, r))
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_unchanged_inputs_are_not_rewritten() {
        let dir = sample_site();
        let site = Site::new(dir.path()).unwrap();
        Generator::new(&site).generate().unwrap();

        let summary = Generator::new(&site).generate().unwrap();
        assert!(summary.written.is_empty());
        assert_eq!(summary.fresh.len(), 7);

        write(
            dir.path(),
            "posts/spring.markdown",
            post_source("Spring Again", "2015-04-01").as_bytes(),
        );
        let summary = Generator::new(&site).generate().unwrap();
        let mut written = summary.written.clone();
        written.sort();
        assert_eq!(
            written,
            vec!["articles.html", "index.html", "posts/spring.html"]
        );
        assert!(read(&site, "articles.html").contains("Spring Again"));
    }

    #[test]
    fn test_deleted_output_is_regenerated() {
        let dir = sample_site();
        let site = Site::new(dir.path()).unwrap();
        Generator::new(&site).generate().unwrap();

        fs::remove_file(site.destination_dir.join("contact.html")).unwrap();
        let summary = Generator::new(&site).generate().unwrap();
        assert_eq!(summary.written, vec!["contact.html"]);
    }

    #[test]
    fn test_post_without_date_fails_build() {
        let dir = sample_site();
        write(
            dir.path(),
            "posts/undated.markdown",
            b"---\ntitle: Undated\n---\nbody\n",
        );
        let site = Site::new(dir.path()).unwrap();
        let err = Generator::new(&site).generate().unwrap_err();

        match err {
            Error::Build(failed) => assert_eq!(failed, vec!["posts/undated.markdown"]),
            other => panic!("unexpected error: {}", other),
        }
        // Unrelated items are still written, the aggregates are not
        assert!(site.destination_dir.join("posts/spring.html").exists());
        assert!(site.destination_dir.join("contact.html").exists());
        assert!(!site.destination_dir.join("articles.html").exists());
        assert!(!site.destination_dir.join("index.html").exists());
    }

    #[test]
    fn test_non_utf8_post_fails_only_that_item() {
        let dir = sample_site();
        write(dir.path(), "posts/binary.markdown", &[0xff, 0xfe, 0xfd]);
        let site = Site::new(dir.path()).unwrap();
        let err = Generator::new(&site).generate().unwrap_err();

        assert!(matches!(err, Error::Build(ref failed) if failed == &vec!["posts/binary.markdown".to_string()]));
        assert!(site.destination_dir.join("posts/year-end.html").exists());
    }

    #[test]
    fn test_missing_template_fails() {
        let dir = sample_site();
        fs::remove_file(dir.path().join("templates/post.html")).unwrap();
        let site = Site::new(dir.path()).unwrap();
        let err = Generator::new(&site).generate().unwrap_err();

        match err {
            Error::Build(failed) => {
                assert!(failed.contains(&"posts/spring.markdown".to_string()));
                assert!(failed.contains(&"posts/year-end.markdown".to_string()));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!site.destination_dir.join("posts/spring.html").exists());
    }

    #[test]
    fn test_unresolved_placeholder_fails() {
        let dir = sample_site();
        write(dir.path(), "index.html", b"{{ subtitle }}");
        let site = Site::new(dir.path()).unwrap();
        let err = Generator::new(&site).generate().unwrap_err();

        assert!(matches!(err, Error::Build(ref failed) if failed == &vec!["index.html".to_string()]));
        assert!(site.destination_dir.join("articles.html").exists());
    }
}
