//! Timing-capability list.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use super::CatalogError;
use crate::fileset_id::FilesetId;

/// One entry of `audio_timestamps_filesets.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingFilesetEntry {
    pub fileset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bible_abbr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_iso: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_type: Option<serde_json::Value>,
}

/// Set of fileset identifiers known to carry timing data.
#[derive(Debug, Clone, Default)]
pub struct TimingIndex {
    ids: HashSet<String>,
}

impl TimingIndex {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the fileset, with its audio format suffix removed, is listed.
    pub fn has_timing(&self, id: &FilesetId) -> bool {
        self.ids.contains(id.timing_key())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Load the timing-capability list. A missing file yields an empty index.
pub fn load_timing_filesets(path: &Path) -> Result<TimingIndex, CatalogError> {
    if !path.exists() {
        warn!(path = %path.display(), "Timing fileset list not found, assuming none");
        return Ok(TimingIndex::default());
    }

    let bytes = std::fs::read(path).map_err(|e| CatalogError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let entries: Vec<TimingFilesetEntry> =
        serde_json::from_slice(&bytes).map_err(|e| CatalogError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

    let index = TimingIndex::new(entries.into_iter().map(|e| e.fileset_id));
    info!("Loaded {} filesets with timing data", index.len());
    Ok(index)
}
