//! Site configuration (site.yml)

use anyhow::{bail, Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path};

/// Name of the optional configuration file in the site root
pub const CONFIG_FILE: &str = "site.yml";

/// Build and preview configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Where rendered files are written
    pub destination_dir: String,
    /// Where the incremental build store lives
    pub store_dir: String,
    /// strftime pattern for the `date` field of posts
    pub date_format: String,
    /// Shell command run by `quire deploy`
    pub deploy_command: Option<String>,
    /// Preview server bind address
    pub preview_host: String,
    /// Preview server port
    pub preview_port: u16,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            destination_dir: "_site".to_string(),
            store_dir: "_cache".to_string(),
            date_format: "%B %e, %Y".to_string(),
            deploy_command: None,
            preview_host: "127.0.0.1".to_string(),
            preview_port: 8000,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse configuration from YAML text; an empty document yields the defaults
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Reject settings that would break a build or make `clean` unsafe
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            bail!("date_format `{}` is not a valid strftime pattern", self.date_format);
        }
        for (key, dir) in [
            ("destination_dir", &self.destination_dir),
            ("store_dir", &self.store_dir),
        ] {
            if !is_subdirectory(dir) {
                bail!("{} must name a subdirectory of the site root, got `{}`", key, dir);
            }
        }
        Ok(())
    }
}

/// A relative path with at least one normal component and no `..`
fn is_subdirectory(dir: &str) -> bool {
    let mut named = false;
    for component in Path::new(dir).components() {
        match component {
            Component::Normal(_) => named = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    named
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.destination_dir, "_site");
        assert_eq!(config.store_dir, "_cache");
        assert_eq!(config.preview_port, 8000);
        assert!(config.deploy_command.is_none());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
destination_dir: public
date_format: "%Y-%m-%d"
deploy_command: rsync -a _site/ host:/srv/www
"#;
        let config = SiteConfig::parse(yaml).unwrap();
        assert_eq!(config.destination_dir, "public");
        assert_eq!(config.date_format, "%Y-%m-%d");
        assert_eq!(
            config.deploy_command.as_deref(),
            Some("rsync -a _site/ host:/srv/www")
        );
        // Unset keys keep their defaults
        assert_eq!(config.store_dir, "_cache");
    }

    #[test]
    fn test_parse_empty_config() {
        assert_eq!(SiteConfig::parse("\n").unwrap(), SiteConfig::default());
    }

    #[test]
    fn test_validate() {
        assert!(SiteConfig::default().validate().is_ok());

        let config = SiteConfig {
            date_format: "%Q".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SiteConfig {
            destination_dir: ".".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dirs_outside_site_root() {
        for dir in ["", "./", "/usr", "/home/me/_site", "..", "../..", "a/../..", "_site/../x"] {
            let config = SiteConfig {
                destination_dir: dir.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "destination_dir {:?}", dir);

            let config = SiteConfig {
                store_dir: dir.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "store_dir {:?}", dir);
        }
    }

    #[test]
    fn test_validate_accepts_nested_dirs() {
        let config = SiteConfig {
            destination_dir: "build/site/".to_string(),
            store_dir: "./.cache".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(SiteConfig::parse("preview_port: not-a-number").is_err());
    }
}
