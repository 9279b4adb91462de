//! Reads a cached catalog snapshot from disk.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::types::{CatalogEntry, CatalogPage};
use super::{CatalogError, PAGE_FILE_PREFIX};

/// Every entry of a catalog snapshot, in page order.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub entries: Vec<CatalogEntry>,
    /// Entries that were not objects and were skipped.
    pub malformed: usize,
    pub page_count: usize,
    /// SHA-256 over the raw page bytes, in page order.
    pub fingerprint: String,
}

/// Load every `bibles_page_{n}.json` in `pages_dir`, ordered by page number.
pub fn load_catalog(pages_dir: &Path) -> Result<CatalogSnapshot, CatalogError> {
    if !pages_dir.is_dir() {
        return Err(CatalogError::NoPages(pages_dir.to_path_buf()));
    }

    let pages = list_page_files(pages_dir)?;
    if pages.is_empty() {
        return Err(CatalogError::NoPages(pages_dir.to_path_buf()));
    }

    let mut hasher = Sha256::new();
    let mut entries = Vec::new();
    let mut malformed = 0;

    for (number, path) in &pages {
        let bytes = std::fs::read(path).map_err(|e| CatalogError::Read {
            path: path.clone(),
            source: e,
        })?;
        hasher.update(&bytes);

        let page: CatalogPage =
            serde_json::from_slice(&bytes).map_err(|e| CatalogError::Parse {
                path: path.clone(),
                source: e,
            })?;
        let (page_entries, page_malformed) = page.into_entries();
        if page_malformed > 0 {
            warn!(
                page = number,
                skipped = page_malformed,
                "Skipping malformed catalog entries"
            );
        }
        debug!(page = number, entries = page_entries.len(), "Loaded catalog page");
        entries.extend(page_entries);
        malformed += page_malformed;
    }

    info!(
        "Loaded {} catalog entries from {} pages ({} malformed skipped)",
        entries.len(),
        pages.len(),
        malformed
    );

    Ok(CatalogSnapshot {
        entries,
        malformed,
        page_count: pages.len(),
        fingerprint: format!("{:x}", hasher.finalize()),
    })
}

/// Page files sorted by their numeric page index.
pub(crate) fn list_page_files(pages_dir: &Path) -> Result<Vec<(u32, PathBuf)>, CatalogError> {
    let read_dir = std::fs::read_dir(pages_dir).map_err(|e| CatalogError::Read {
        path: pages_dir.to_path_buf(),
        source: e,
    })?;

    let mut pages = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|e| CatalogError::Read {
            path: pages_dir.to_path_buf(),
            source: e,
        })?;
        let path = dir_entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(number) = page_number(name) {
            pages.push((number, path));
        }
    }

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages)
}

fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(PAGE_FILE_PREFIX)?
        .strip_suffix(".json")?
        .parse()
        .ok()
}
