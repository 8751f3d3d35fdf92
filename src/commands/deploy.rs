//! Deploy the generated site

use anyhow::{bail, Context, Result};
use std::process::Command;

use crate::Site;

/// Run the configured deploy command from the site root
pub fn run(site: &Site) -> Result<()> {
    let Some(command) = site.config.deploy_command.as_deref() else {
        bail!("No deploy_command configured in {}", crate::config::CONFIG_FILE);
    };

    tracing::info!("Deploying with: {}", command);
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(&site.base_dir)
        .status()
        .with_context(|| format!("running deploy command `{}`", command))?;

    if !status.success() {
        bail!("Deploy command `{}` failed with {}", command, status);
    }
    Ok(())
}
