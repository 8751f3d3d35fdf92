//! Check the generated site for broken internal links

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::content::loader::identifier_for;
use crate::helpers::{collect_urls, is_root_relative};
use crate::Site;

lazy_static! {
    static ref SCHEME: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap();
}

/// A link whose target does not exist in the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    /// Output page containing the link
    pub page: String,
    /// The link as written
    pub url: String,
}

impl fmt::Display for BrokenLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.page, self.url)
    }
}

/// Result of a link check
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// HTML files inspected
    pub pages: usize,
    /// Internal links followed
    pub links: usize,
    pub broken: Vec<BrokenLink>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.broken.is_empty()
    }
}

/// Walk every HTML file in the output and resolve its internal links
pub fn run(site: &Site) -> Result<CheckReport> {
    let root = &site.destination_dir;
    if !root.is_dir() {
        anyhow::bail!("{} does not exist; build the site first", root.display());
    }

    let mut report = CheckReport::default();
    let mut pages: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("html" | "htm")))
        .collect();
    pages.sort();

    for page in pages {
        let html = fs::read_to_string(&page).with_context(|| format!("reading {}", page.display()))?;
        let page_id = identifier_for(root, &page).unwrap_or_else(|| page.display().to_string());
        report.pages += 1;

        let urls = match collect_urls(&html) {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!("Could not parse {}: {}", page_id, e);
                continue;
            }
        };

        for url in urls {
            let Some(target) = resolve(root, &page, &url) else {
                continue;
            };
            report.links += 1;
            if !exists(&target) {
                tracing::warn!("Broken link in {}: {}", page_id, url);
                report.broken.push(BrokenLink {
                    page: page_id.clone(),
                    url,
                });
            }
        }
    }

    tracing::info!(
        "Checked {} links in {} pages, {} broken",
        report.links,
        report.pages,
        report.broken.len()
    );
    Ok(report)
}

/// Filesystem target of an internal link, `None` for links we do not follow
fn resolve(root: &Path, page: &Path, url: &str) -> Option<PathBuf> {
    if url.is_empty() || url.starts_with('#') || url.starts_with("//") || SCHEME.is_match(url) {
        return None;
    }

    let path = url.split(['#', '?']).next().unwrap_or("");
    if path.is_empty() {
        return None;
    }

    if is_root_relative(path) {
        Some(root.join(path.trim_start_matches('/')))
    } else {
        Some(page.parent().unwrap_or(root).join(path))
    }
}

fn exists(target: &Path) -> bool {
    if target.is_dir() {
        target.join("index.html").is_file()
    } else {
        target.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_check_finds_broken_links() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("_site");
        write(
            &out,
            "index.html",
            r##"<a href="./posts/a.html">a</a><a href="./posts/missing.html">m</a><a href="https://example.com/">x</a><a href="#top">t</a><a href="mailto:a@b.c">m</a>"##,
        );
        write(
            &out,
            "posts/a.html",
            r#"<link href="../css/default.css"><a href="../index.html?ref=a#top">home</a><img src="/images/none.png">"#,
        );
        write(&out, "css/default.css", "body{}");

        let site = Site::new(dir.path()).unwrap();
        let report = run(&site).unwrap();

        assert_eq!(report.pages, 2);
        assert_eq!(report.links, 5);
        assert_eq!(
            report.broken,
            vec![
                BrokenLink {
                    page: "index.html".to_string(),
                    url: "./posts/missing.html".to_string(),
                },
                BrokenLink {
                    page: "posts/a.html".to_string(),
                    url: "/images/none.png".to_string(),
                },
            ]
        );
        assert!(!report.is_ok());
    }

    #[test]
    fn test_check_requires_output() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert!(run(&site).is_err());
    }

    #[test]
    fn test_resolve_skips_external() {
        let root = Path::new("/site");
        let page = Path::new("/site/posts/a.html");
        assert_eq!(resolve(root, page, "https://x.org"), None);
        assert_eq!(resolve(root, page, "data:image/png;base64,AAAA"), None);
        assert_eq!(resolve(root, page, "//cdn.x.org/a.js"), None);
        assert_eq!(resolve(root, page, "#frag"), None);
        assert_eq!(
            resolve(root, page, "/css/a.css"),
            Some(PathBuf::from("/site/css/a.css"))
        );
        assert_eq!(
            resolve(root, page, "b.html#x"),
            Some(PathBuf::from("/site/posts/b.html"))
        );
    }
}
