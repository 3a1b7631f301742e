//! Fetch handler: scrape a listing page and download each paper's sources.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::{config::Config, external::arxiv::ArxivClient};

pub async fn run(cfg: &Config, url: Option<&str>, ids: &[String], out: &Path) -> Result<()> {
    let client = ArxivClient::from_config(cfg)?;

    let mut all_ids = ids.to_vec();
    if let Some(url) = url {
        let found = client
            .list_ids(url)
            .await
            .with_context(|| format!("fetching listing {}", url))?;
        println!("Found {} arXiv IDs.", found.len());
        all_ids.extend(found);
    }

    for id in &all_ids {
        let dest = out.join(id);
        if dest.exists() {
            info!("Skipping {} (already exists)", id);
            continue;
        }
        info!("Downloading source for {}", id);
        let files = client
            .download_source(id, &dest)
            .await
            .with_context(|| format!("downloading source for {}", id))?;
        info!("{}: {} file(s) unpacked", id, files.len());
    }
    Ok(())
}
