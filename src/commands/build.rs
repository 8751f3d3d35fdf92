//! Build the site

use anyhow::Result;

use crate::generator::{BuildSummary, Generator};
use crate::Site;

/// Run the full pipeline once
pub fn run(site: &Site) -> Result<BuildSummary> {
    tracing::info!("Building {:?} into {:?}", site.base_dir, site.destination_dir);
    let summary = Generator::new(site).generate()?;
    Ok(summary)
}
