//! Classified metadata records and classification outputs.

use serde::{Deserialize, Serialize};

use super::book_set::BookSet;
use super::exclusions::{ExclusionLedger, ExclusionSummary};
use crate::canon::Testament;
use crate::fileset_id::FilesetId;
use crate::matcher::SyncablePair;

/// Where a fileset's alignment data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Published timing data exists for the audio.
    Timing,
    /// Audio and text can be aligned locally.
    Sync,
}

/// A language, built from the first catalog entry that names it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRecord {
    pub iso: String,
    pub language_id: Option<u64>,
    pub name: String,
    pub autonym: String,
}

/// Work (translation) reference carried by every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRef {
    pub abbr: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesetInfo {
    pub id: FilesetId,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: String,
    pub volume: String,
    pub date: String,
    /// Raw character at position 7 of the identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorization {
    pub has_text: bool,
    pub has_audio: bool,
    pub has_timing: bool,
    pub data_source: Option<DataSource>,
    pub book_set: BookSet,
    pub syncable: bool,
    #[serde(default)]
    pub audio_text_pairs: Vec<SyncablePair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadReady {
    pub text_fileset: Option<FilesetId>,
    pub audio_fileset: Option<FilesetId>,
    pub timing_available: bool,
}

/// One normalized record per (language, fileset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedMetadata {
    pub language: LanguageRecord,
    pub bible: WorkRef,
    pub fileset: FilesetInfo,
    pub categorization: Categorization,
    pub download_ready: DownloadReady,
}

impl ClassifiedMetadata {
    pub fn id(&self) -> &FilesetId {
        &self.fileset.id
    }

    pub fn language_code(&self) -> &str {
        &self.language.iso
    }

    pub fn book_set(&self) -> BookSet {
        self.categorization.book_set
    }

    /// Whether this fileset's scope includes `book`.
    pub fn covers(&self, book: &str) -> bool {
        self.categorization.book_set.covers(book)
    }

    /// Whether the scope spans the given testament (FULL spans both).
    pub fn spans(&self, testament: Testament) -> bool {
        matches!(
            (self.categorization.book_set, testament),
            (BookSet::Full, _) | (BookSet::Ot, Testament::Old) | (BookSet::Nt, Testament::New)
        )
    }

    /// Deduplication key grouping every format of one translation.
    ///
    /// The catalog abbreviation when present, otherwise a stem derived from
    /// the fileset identifier.
    pub fn work_identity(&self) -> String {
        if self.bible.abbr.is_empty() {
            self.fileset.id.derived_work_stem()
        } else {
            self.bible.abbr.clone()
        }
    }
}

/// Records and pairs produced for one language.
#[derive(Debug, Clone)]
pub struct LanguageClassification {
    pub language: LanguageRecord,
    pub records: Vec<ClassifiedMetadata>,
    pub syncable_pairs: Vec<SyncablePair>,
}

impl LanguageClassification {
    pub fn audio_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.categorization.has_audio)
            .count()
    }

    pub fn text_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.categorization.has_text)
            .count()
    }

    pub fn timing_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.categorization.has_audio && r.categorization.has_timing)
            .count()
    }
}

/// Everything one classification run produces.
#[derive(Debug, Clone)]
pub struct ClassificationOutput {
    pub languages: Vec<LanguageClassification>,
    pub exclusions: ExclusionLedger,
    /// Size of the timing-capability list the run was given.
    pub timing_filesets_available: usize,
}

impl ClassificationOutput {
    pub fn record_count(&self) -> usize {
        self.languages.iter().map(|l| l.records.len()).sum()
    }

    /// Cross-language counts, tagged with the snapshot fingerprint.
    pub fn summary(&self, catalog_fingerprint: &str) -> ClassificationSummary {
        ClassificationSummary {
            total_languages: self.languages.len(),
            total_filesets: self.record_count(),
            timing_filesets_available: self.timing_filesets_available,
            syncable_pairs: self.languages.iter().map(|l| l.syncable_pairs.len()).sum(),
            filesets_with_timing: self.languages.iter().map(|l| l.timing_count()).sum(),
            audio_filesets: self.languages.iter().map(|l| l.audio_count()).sum(),
            text_filesets: self.languages.iter().map(|l| l.text_count()).sum(),
            exclusions: self.exclusions.summary(),
            catalog_fingerprint: catalog_fingerprint.to_string(),
        }
    }
}

/// Persisted as `summary.json` next to the metadata tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub total_languages: usize,
    pub total_filesets: usize,
    pub timing_filesets_available: usize,
    pub syncable_pairs: usize,
    pub filesets_with_timing: usize,
    pub audio_filesets: usize,
    pub text_filesets: usize,
    pub exclusions: ExclusionSummary,
    pub catalog_fingerprint: String,
}
