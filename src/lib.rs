//! quire: a small static site generator for a markdown blog
//!
//! The site root holds a fixed layout (`images/`, `css/`, `contact.markdown`,
//! `posts/`, `templates/`, `index.html`). Building routes every file, applies
//! its class-specific transform, renders the article index and home page from
//! all posts newest first, and rewrites root-relative links so the output
//! works from any host and path.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod routes;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub use error::Error;
pub use generator::BuildSummary;

/// A site rooted at a directory
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Site root; all content identifiers are relative to it
    pub base_dir: PathBuf,
    /// Where rendered files are written
    pub destination_dir: PathBuf,
    /// Where the incremental build store lives
    pub store_dir: PathBuf,
}

impl Site {
    /// Open a site, reading `site.yml` from its root when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join(config::CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Self::with_config(base_dir, config)
    }

    /// Open a site with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Result<Self> {
        config.validate()?;

        let base_dir = base_dir.as_ref();
        let base_dir = fs::canonicalize(base_dir).unwrap_or_else(|_| base_dir.to_path_buf());
        let destination_dir = base_dir.join(&config.destination_dir);
        let store_dir = base_dir.join(&config.store_dir);

        Ok(Self {
            config,
            base_dir,
            destination_dir,
            store_dir,
        })
    }

    /// Whether a changed path can affect the build
    pub fn is_source_path(&self, path: &Path) -> bool {
        path.starts_with(&self.base_dir)
            && !path.starts_with(&self.destination_dir)
            && !path.starts_with(&self.store_dir)
            && !content::loader::is_ignored(path)
    }

    /// Generate the static site
    pub fn build(&self) -> Result<BuildSummary> {
        commands::build::run(self)
    }

    /// Remove generated output and the build store
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Clean, then build from scratch
    pub fn rebuild(&self) -> Result<BuildSummary> {
        self.clean()?;
        self.build()
    }

    /// Look for broken internal links in the generated site
    pub fn check(&self) -> Result<commands::check::CheckReport> {
        commands::check::run(self)
    }

    /// Run the configured deploy command
    pub fn deploy(&self) -> Result<()> {
        commands::deploy::run(self)
    }
}
