//! Filesystem-backed metadata repository.
//!
//! ```text
//! {root}/{iso}/{fileset_id}/metadata.json
//! {root}/exclude_download.json
//! {root}/summary.json
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::types::LanguageMetadata;
use super::{MetadataRepository, RepositoryError};
use crate::classifier::{
    ClassificationSummary, ClassifiedMetadata, ExclusionDocument, ExclusionSet,
};

pub const METADATA_FILE: &str = "metadata.json";
pub const EXCLUSIONS_FILE: &str = "exclude_download.json";
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Clone)]
pub struct FsMetadataRepository {
    root: PathBuf,
}

impl FsMetadataRepository {
    /// Open an existing repository. Fails if `root` is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(RepositoryError::MissingRoot(root));
        }
        Ok(Self { root })
    }

    /// Open a repository, creating the root directory if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| RepositoryError::Write {
            path: root.clone(),
            source: e,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, iso: &str, fileset_id: &str) -> PathBuf {
        self.root.join(iso).join(fileset_id).join(METADATA_FILE)
    }

    /// The language directory plus any `{iso}_*` regional variants.
    fn language_dirs(&self, iso: &str) -> Result<Vec<PathBuf>, RepositoryError> {
        let variant_prefix = format!("{}_", iso);
        let mut dirs = Vec::new();
        for entry in self.read_dir(&self.root)? {
            let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if entry.is_dir() && (name == iso || name.starts_with(&variant_prefix)) {
                dirs.push(entry.clone());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, RepositoryError> {
        let read_dir = std::fs::read_dir(dir).map_err(|e| RepositoryError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| RepositoryError::Read {
                path: dir.to_path_buf(),
                source: e,
            })?;
            paths.push(entry.path());
        }
        Ok(paths)
    }
}

/// Pretty JSON with a trailing newline, the on-disk form of every document.
fn to_document_bytes<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, RepositoryError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write via a sibling temp file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RepositoryError> {
    let write_err = |e| RepositoryError::Write {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, bytes).map_err(write_err)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    Ok(())
}

fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RepositoryError> {
    let bytes = std::fs::read(path).map_err(|e| RepositoryError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })
}

impl MetadataRepository for FsMetadataRepository {
    fn store(&self, record: &ClassifiedMetadata) -> Result<bool, RepositoryError> {
        let path = self.record_path(record.language_code(), record.id().as_str());
        let bytes = to_document_bytes(record)?;

        if let Ok(existing) = std::fs::read(&path) {
            if existing == bytes {
                return Ok(false);
            }
        }

        write_atomic(&path, &bytes)?;
        Ok(true)
    }

    fn load_language(&self, iso: &str) -> Result<LanguageMetadata, RepositoryError> {
        let mut metadata = LanguageMetadata::new(iso);

        for language_dir in self.language_dirs(iso)? {
            for fileset_dir in self.read_dir(&language_dir)? {
                let path = fileset_dir.join(METADATA_FILE);
                if !path.is_file() {
                    continue;
                }
                match read_document::<ClassifiedMetadata>(&path) {
                    Ok(record) => metadata.insert(record),
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable metadata"),
                }
            }
        }

        debug!(iso, records = metadata.len(), "Loaded language metadata");
        Ok(metadata)
    }

    fn language_exists(&self, iso: &str) -> Result<bool, RepositoryError> {
        Ok(!self.language_dirs(iso)?.is_empty())
    }

    fn list_languages(&self) -> Result<Vec<String>, RepositoryError> {
        let mut languages = BTreeSet::new();
        for entry in self.read_dir(&self.root)? {
            if !entry.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let base = name.split('_').next().unwrap_or(name);
            if base.chars().count() == 3 {
                languages.insert(base.to_string());
            }
        }
        Ok(languages.into_iter().collect())
    }

    fn store_exclusions(&self, document: &ExclusionDocument) -> Result<(), RepositoryError> {
        write_atomic(&self.root.join(EXCLUSIONS_FILE), &to_document_bytes(document)?)
    }

    fn load_exclusions(&self) -> Result<ExclusionSet, RepositoryError> {
        let path = self.root.join(EXCLUSIONS_FILE);
        if !path.is_file() {
            warn!(path = %path.display(), "No exclusion document, nothing excluded");
            return Ok(ExclusionSet::default());
        }
        let document: ExclusionDocument = read_document(&path)?;
        Ok(ExclusionSet::from_ledger(&document.exclusions))
    }

    fn store_summary(&self, summary: &ClassificationSummary) -> Result<(), RepositoryError> {
        write_atomic(&self.root.join(SUMMARY_FILE), &to_document_bytes(summary)?)
    }

    fn load_summary(&self) -> Result<Option<ClassificationSummary>, RepositoryError> {
        let path = self.root.join(SUMMARY_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        read_document(&path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{
        BookSet, ExclusionCategory, ExclusionLedger, ExclusionRecord, ExclusionSummary,
    };
    use crate::fileset_id::FilesetId;
    use crate::repository::LanguageCategory;
    use crate::testing::fixtures::metadata_record;
    use tempfile::TempDir;

    fn repo() -> (TempDir, FsMetadataRepository) {
        let dir = TempDir::new().unwrap();
        let repo = FsMetadataRepository::create(dir.path().join("metadata")).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_open_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = FsMetadataRepository::open(dir.path().join("nope"));
        assert!(matches!(result, Err(RepositoryError::MissingRoot(_))));
    }

    #[test]
    fn test_store_and_load_round_trip() {
        let (_dir, repo) = repo();
        let record = metadata_record("eng", "ENGWEB", "ENGWEBN1DA", "audio", BookSet::Nt);

        assert!(repo.store(&record).unwrap());
        assert!(repo.record_path("eng", "ENGWEBN1DA").is_file());

        let loaded = repo.load_language("eng").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(&FilesetId::new("ENGWEBN1DA")), Some(&record));
    }

    #[test]
    fn test_store_is_idempotent() {
        let (_dir, repo) = repo();
        let record = metadata_record("eng", "ENGWEB", "ENGWEBN1DA", "audio", BookSet::Nt);

        assert!(repo.store(&record).unwrap());
        let first = std::fs::read(repo.record_path("eng", "ENGWEBN1DA")).unwrap();
        assert!(!repo.store(&record).unwrap());
        let second = std::fs::read(repo.record_path("eng", "ENGWEBN1DA")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_regional_variants() {
        let (_dir, repo) = repo();
        repo.store(&metadata_record("eng_US", "ENGWEB", "ENGWEBN1DA", "audio", BookSet::Nt))
            .unwrap();
        repo.store(&metadata_record("spa", "SPNBDA", "SPNBDAN1DA", "audio", BookSet::Nt))
            .unwrap();

        assert!(repo.language_exists("eng").unwrap());
        assert!(repo.language_exists("spa").unwrap());
        assert!(!repo.language_exists("fra").unwrap());
        assert!(!repo.language_exists("en").unwrap());

        assert_eq!(repo.load_language("eng").unwrap().len(), 1);
        assert_eq!(repo.list_languages().unwrap(), vec!["eng", "spa"]);
    }

    #[test]
    fn test_load_skips_malformed_records() {
        let (_dir, repo) = repo();
        repo.store(&metadata_record("eng", "ENGWEB", "ENGWEBN1DA", "audio", BookSet::Nt))
            .unwrap();
        let bad = repo.record_path("eng", "BROKEN");
        std::fs::create_dir_all(bad.parent().unwrap()).unwrap();
        std::fs::write(&bad, "{").unwrap();

        assert_eq!(repo.load_language("eng").unwrap().len(), 1);
    }

    #[test]
    fn test_exclusions_round_trip() {
        let (_dir, repo) = repo();
        assert!(repo.load_exclusions().unwrap().is_empty());

        let mut ledger = ExclusionLedger::default();
        ledger.record(
            ExclusionCategory::SaVersions,
            ExclusionRecord {
                iso: "eng".to_string(),
                language: "English".to_string(),
                bible_abbr: "ENGWEB".to_string(),
                bible_name: "WEB".to_string(),
                fileset_id: FilesetId::new("ENGWEBN2SA"),
                fileset_type: "audio_drama".to_string(),
                size: "NT".to_string(),
                book_set: None,
                reason: String::new(),
            },
        );
        repo.store_exclusions(&ExclusionDocument::new(ledger)).unwrap();

        let set = repo.load_exclusions().unwrap();
        assert!(set.is_excluded(&FilesetId::new("ENGWEBN2SA")));
    }

    #[test]
    fn test_summary_round_trip() {
        let (_dir, repo) = repo();
        assert_eq!(repo.load_summary().unwrap(), None);

        let summary = ClassificationSummary {
            total_languages: 1,
            total_filesets: 2,
            timing_filesets_available: 0,
            syncable_pairs: 1,
            filesets_with_timing: 0,
            audio_filesets: 1,
            text_filesets: 1,
            exclusions: ExclusionSummary::default(),
            catalog_fingerprint: "f00".to_string(),
        };
        repo.store_summary(&summary).unwrap();
        assert_eq!(repo.load_summary().unwrap(), Some(summary));
    }

    #[test]
    fn test_languages_by_category() {
        let (_dir, repo) = repo();
        let mut synced = metadata_record("eng", "ENGWEB", "ENGWEBN1DA", "audio", BookSet::Nt);
        synced.categorization.syncable = true;
        synced.categorization.data_source = Some(crate::classifier::DataSource::Sync);
        repo.store(&synced).unwrap();
        repo.store(&metadata_record("spa", "SPNBDA", "SPNBDAN1DA", "audio", BookSet::Nt))
            .unwrap();

        assert_eq!(
            repo.languages_by_category(LanguageCategory::SyncNt).unwrap(),
            vec!["eng"]
        );
        assert_eq!(
            repo.languages_by_category(LanguageCategory::All).unwrap(),
            vec!["eng", "spa"]
        );
    }
}
