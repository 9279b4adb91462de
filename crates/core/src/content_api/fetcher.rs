//! Catalog cache refresh.
//!
//! Pages are written exactly as the service returned them, so fields the
//! classifier does not model (such as `timing_est_err`) survive in the cache.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{CatalogSource, FetchError};
use crate::catalog::{self, list_page_files, TimingFilesetEntry};
use crate::config::CatalogFetchConfig;

/// Result of a cache refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub pages: u32,
    pub entries: usize,
    pub timing_filesets: usize,
    pub stale_pages_removed: usize,
}

/// Walks the paginated catalog and rebuilds the local cache.
pub struct CatalogFetcher {
    source: Arc<dyn CatalogSource>,
    cache_dir: PathBuf,
    page_size: u32,
    page_delay: Duration,
}

impl CatalogFetcher {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        cache_dir: impl Into<PathBuf>,
        settings: &CatalogFetchConfig,
    ) -> Self {
        Self {
            source,
            cache_dir: cache_dir.into(),
            page_size: settings.page_size,
            page_delay: Duration::from_millis(settings.page_delay_ms),
        }
    }

    /// Fetch every page, then derive the timing-capability list.
    pub async fn fetch_all(&self) -> Result<FetchReport, FetchError> {
        let pages_dir = catalog::pages_dir(&self.cache_dir);
        create_dir(&pages_dir)?;

        let mut report = FetchReport::default();
        let mut page = 1;

        loop {
            debug!(page, "Fetching catalog page");
            let document = self.source.catalog_page(page, self.page_size).await?;

            let Some(data) = document.get("data").and_then(Value::as_array) else {
                warn!(page, "Catalog page has no data, stopping");
                break;
            };
            report.entries += data.len();

            write_json(&catalog::page_path(&self.cache_dir, page), &document)?;
            report.pages = page;
            info!(page, entries = data.len(), "Saved catalog page");

            if !has_next_page(&document) {
                break;
            }
            page += 1;
            tokio::time::sleep(self.page_delay).await;
        }

        report.stale_pages_removed = self.remove_pages_after(report.pages)?;

        let timing = derive_timing_list(&pages_dir)?;
        report.timing_filesets = timing.len();
        let timing_path = catalog::timing_list_path(&self.cache_dir);
        if let Some(parent) = timing_path.parent() {
            create_dir(parent)?;
        }
        write_json(&timing_path, &timing)?;

        info!(
            pages = report.pages,
            entries = report.entries,
            timing_filesets = report.timing_filesets,
            "Catalog cache refreshed"
        );
        Ok(report)
    }

    /// Remove pages left over from a previous, longer catalog.
    fn remove_pages_after(&self, last_page: u32) -> Result<usize, FetchError> {
        let pages_dir = catalog::pages_dir(&self.cache_dir);
        let mut removed = 0;
        for (number, path) in list_page_files(&pages_dir)? {
            if number > last_page {
                fs::remove_file(&path).map_err(|source| FetchError::Io {
                    path: path.clone(),
                    source,
                })?;
                debug!(path = %path.display(), "Removed stale catalog page");
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn has_next_page(document: &Value) -> bool {
    document
        .pointer("/meta/pagination/next_page_url")
        .map(|next| match next {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .unwrap_or(false)
}

/// Scan cached pages for timing-capable filesets.
///
/// A fileset qualifies if it carries a `timing_est_err` field or its
/// identifier mentions "timing".
pub fn derive_timing_list(pages_dir: &Path) -> Result<Vec<TimingFilesetEntry>, FetchError> {
    let mut entries = Vec::new();

    for (_, path) in list_page_files(pages_dir)? {
        let raw = fs::read_to_string(&path).map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
        let document: Value = serde_json::from_str(&raw)
            .map_err(|e| FetchError::ParseError(format!("{}: {}", path.display(), e)))?;

        let works = document.get("data").and_then(Value::as_array);
        for work in works.into_iter().flatten() {
            let Some(platforms) = work.get("filesets").and_then(Value::as_object) else {
                continue;
            };
            for fileset in platforms.values().filter_map(Value::as_array).flatten() {
                let id = fileset.get("id").and_then(Value::as_str).unwrap_or_default();
                let timing_marker = fileset.get("timing_est_err");
                if timing_marker.is_none() && !id.to_lowercase().contains("timing") {
                    continue;
                }
                entries.push(TimingFilesetEntry {
                    fileset_id: id.to_string(),
                    bible_abbr: string_field(work, "abbr"),
                    language_iso: string_field(work, "iso"),
                    timing_type: Some(
                        timing_marker
                            .cloned()
                            .unwrap_or_else(|| Value::String("unknown".to_string())),
                    ),
                });
            }
        }
    }

    Ok(entries)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn create_dir(path: &Path) -> Result<(), FetchError> {
    fs::create_dir_all(path).map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), FetchError> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| FetchError::ParseError(e.to_string()))?;
    bytes.push(b'\n');
    fs::write(path, bytes).map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })
}
