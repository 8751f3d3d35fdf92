//! Rebuild on change, optionally serving the output

use anyhow::Result;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::error::report;
use crate::Site;

/// Build once, then rebuild whenever a source file changes.
///
/// With `serve` set, the output directory is also served on that address.
pub async fn run(site: &Site, serve: Option<(String, u16)>) -> Result<()> {
    rebuild(site);

    if let Some((host, port)) = serve {
        let server_site = site.clone();
        tokio::spawn(async move {
            if let Err(e) = crate::server::start(&server_site, &host, port).await {
                tracing::error!("Preview server stopped: {:#}", e);
            }
        });
    }

    let site = site.clone();
    tokio::task::spawn_blocking(move || watch_loop(&site)).await??;
    Ok(())
}

fn watch_loop(site: &Site) -> Result<()> {
    let (tx, rx) = channel::<DebounceEventResult>();
    let mut debouncer = new_debouncer(Duration::from_millis(250), tx)?;
    debouncer
        .watcher()
        .watch(&site.base_dir, RecursiveMode::Recursive)?;

    tracing::info!("Watching {:?} for changes. Press Ctrl+C to stop.", site.base_dir);

    for result in rx {
        match result {
            Ok(events) => {
                let changed: Vec<_> = events
                    .iter()
                    .filter(|e| site.is_source_path(&e.path))
                    .collect();
                if changed.is_empty() {
                    continue;
                }
                for event in &changed {
                    tracing::info!("Changed: {:?}", event.path);
                }
                rebuild(site);
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        }
    }

    Ok(())
}

/// Build, logging rather than propagating failures so watching continues
fn rebuild(site: &Site) {
    match site.build() {
        Ok(summary) => tracing::info!(
            "Rebuilt: {} written, {} up to date",
            summary.written.len(),
            summary.fresh.len()
        ),
        Err(e) => match e.downcast_ref::<crate::Error>() {
            Some(err) => tracing::error!("Build failed: {}", report(err)),
            None => tracing::error!("Build failed: {:#}", e),
        },
    }
}
