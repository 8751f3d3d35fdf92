//! Clean generated output

use anyhow::{Context, Result};
use std::fs;

use crate::Site;

/// Remove the destination directory and the build store
pub fn run(site: &Site) -> Result<()> {
    for dir in [&site.destination_dir, &site.store_dir] {
        if dir.exists() {
            fs::remove_dir_all(dir).with_context(|| format!("removing {}", dir.display()))?;
            tracing::info!("Deleted: {:?}", dir);
        }
    }
    Ok(())
}
