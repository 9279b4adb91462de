//! Catalog snapshot - the cached, paginated list of works and their filesets.
//!
//! Layout of the cache directory:
//!
//! ```text
//! {cache}/bibles/bibles_page_{n}.json
//! {cache}/samples/audio_timestamps_filesets.json
//! ```

mod loader;
mod timing;
mod types;

pub use loader::{load_catalog, CatalogSnapshot};
pub(crate) use loader::list_page_files;
pub use timing::{load_timing_filesets, TimingFilesetEntry, TimingIndex};
pub use types::*;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Subdirectory holding the paginated catalog.
pub const PAGES_DIR: &str = "bibles";
/// Subdirectory holding auxiliary documents.
pub const SAMPLES_DIR: &str = "samples";
/// File name of the timing-capability list inside [`SAMPLES_DIR`].
pub const TIMING_LIST_FILE: &str = "audio_timestamps_filesets.json";

pub(crate) const PAGE_FILE_PREFIX: &str = "bibles_page_";

pub fn pages_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join(PAGES_DIR)
}

pub fn page_path(cache_dir: &Path, page: u32) -> PathBuf {
    pages_dir(cache_dir).join(format!("{}{}.json", PAGE_FILE_PREFIX, page))
}

pub fn timing_list_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(SAMPLES_DIR).join(TIMING_LIST_FILE)
}

/// Errors reading the catalog snapshot.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No catalog pages found in {0} (run `versekit fetch` first)")]
    NoPages(PathBuf),

    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
