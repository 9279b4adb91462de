//! `versekit fetch`: refresh the catalog cache.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use versekit_core::{require_credentials, CatalogFetcher, Config, DbpClient};

pub async fn run(config: &Config) -> Result<()> {
    require_credentials(config)?;
    let client = DbpClient::new(&config.content_api).context("Failed to create content API client")?;

    let fetcher = CatalogFetcher::new(
        Arc::new(client),
        &config.paths.cache_dir,
        &config.catalog_fetch,
    );
    let report = fetcher.fetch_all().await.context("Catalog fetch failed")?;

    info!(
        pages = report.pages,
        entries = report.entries,
        timing_filesets = report.timing_filesets,
        stale_pages_removed = report.stale_pages_removed,
        cache = %config.paths.cache_dir.display(),
        "Fetch complete"
    );
    Ok(())
}
