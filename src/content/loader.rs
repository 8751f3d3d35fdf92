//! Content loader - discovers source files under the site root

use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use super::{ContentClass, Item};
use crate::error::{Error, Result};
use crate::Site;

/// Discovers content items for a site
pub struct ContentLoader<'a> {
    site: &'a Site,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    /// Enumerate every file that belongs to a known content class.
    ///
    /// Output and store directories are never descended into. Files outside
    /// the known classes are skipped without comment. Items come back sorted
    /// by identifier so every later stage sees the same order.
    pub fn discover(&self) -> Result<Vec<Item>> {
        let base_dir = &self.site.base_dir;
        let mut items = Vec::new();

        let walker = WalkDir::new(base_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !self.is_excluded_dir(e));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(base_dir.as_path()).to_path_buf();
                Error::io(path, e.into())
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || is_ignored(path) {
                continue;
            }

            let Some(identifier) = identifier_for(base_dir, path) else {
                continue;
            };
            let Some(class) = ContentClass::classify(&identifier) else {
                continue;
            };

            let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
            tracing::debug!("Discovered {:?}: {}", class, identifier);
            items.push(Item {
                identifier,
                class,
                bytes,
            });
        }

        items.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(items)
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() || entry.depth() == 0 {
            return false;
        }
        let path = entry.path();
        path == self.site.destination_dir
            || path == self.site.store_dir
            || is_ignored(path)
    }
}

/// Identifier of `path` relative to `base_dir`, with `/` separators
pub fn identifier_for(base_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base_dir).ok()?;
    let parts: Option<Vec<&str>> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect();
    Some(parts?.join("/"))
}

/// Editor droppings and hidden files are never site content
pub fn is_ignored(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with('.') || name.starts_with('#') || name.ends_with('~') || name.ends_with(".swp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_known_classes_only() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "images/a.png", &[0x89, 0x50]);
        write(root, "css/default.css", b"body {}");
        write(root, "contact.markdown", b"hi");
        write(root, "posts/b.markdown", b"---\ntitle: B\ndate: 2015-01-01\n---\n");
        write(root, "templates/default.html", b"{{ body }}");
        write(root, "index.html", b"home");
        write(root, "README.md", b"not content");
        write(root, "posts/.b.markdown.swp", b"swap");
        write(root, "posts/c.markdown~", b"backup");
        write(root, "_site/index.html", b"old output");

        let site = Site::new(root).unwrap();
        let items = ContentLoader::new(&site).discover().unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "contact.markdown",
                "css/default.css",
                "images/a.png",
                "index.html",
                "posts/b.markdown",
                "templates/default.html",
            ]
        );
        assert_eq!(items[2].bytes, vec![0x89, 0x50]);
    }

    #[test]
    fn test_is_ignored() {
        assert!(is_ignored(Path::new("posts/.hidden")));
        assert!(is_ignored(Path::new("posts/#autosave#")));
        assert!(is_ignored(Path::new("posts/a.markdown~")));
        assert!(!is_ignored(Path::new("posts/a.markdown")));
    }
}
