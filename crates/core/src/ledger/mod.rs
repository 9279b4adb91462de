//! Per-language error ledger.
//!
//! Every failed acquisition step is appended to `{dir}/{iso}_errors.json`
//! under its (book, chapter) entry. The document is saved after each
//! append, so an interrupted run keeps everything recorded so far.

mod types;

pub use types::*;

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::ArtifactKind;

/// Errors reading or writing the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to read error ledger {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write error ledger {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error ledger for one language, backed by a JSON file.
#[derive(Debug)]
pub struct ErrorLedger {
    path: PathBuf,
    document: ErrorLedgerDocument,
}

impl ErrorLedger {
    pub fn ledger_path(dir: &Path, iso: &str) -> PathBuf {
        dir.join(format!("{}_errors.json", iso))
    }

    /// Open the ledger for `iso`, continuing an existing document if present.
    ///
    /// A document that no longer parses is moved aside to `*.json.bad` and a
    /// fresh ledger is started.
    pub fn open(dir: &Path, iso: &str) -> Result<Self, LedgerError> {
        let path = Self::ledger_path(dir, iso);
        if !path.exists() {
            return Ok(Self {
                path,
                document: ErrorLedgerDocument::new(iso),
            });
        }

        let bytes = fs::read(&path).map_err(|source| LedgerError::Read {
            path: path.clone(),
            source,
        })?;
        let document = match serde_json::from_slice(&bytes) {
            Ok(document) => document,
            Err(e) => {
                let backup = Self::backup_path(&path);
                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "Error ledger is malformed, starting a fresh one"
                );
                if let Err(e) = fs::rename(&path, &backup) {
                    warn!(path = %path.display(), error = %e, "Failed to move malformed ledger aside");
                }
                ErrorLedgerDocument::new(iso)
            }
        };
        Ok(Self { path, document })
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".bad");
        path.with_file_name(name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[AcquisitionErrorEntry] {
        &self.document.errors
    }

    /// Append a failure to the (book, chapter) entry and save.
    pub fn record(
        &mut self,
        book: &str,
        chapter: u32,
        content: ArtifactKind,
        error: FormatError,
    ) -> Result<(), LedgerError> {
        let index = match self
            .document
            .errors
            .iter()
            .position(|e| e.book == book && e.chapter == chapter)
        {
            Some(index) => index,
            None => {
                self.document
                    .errors
                    .push(AcquisitionErrorEntry::new(book, chapter));
                self.document.errors.len() - 1
            }
        };

        let entry = &mut self.document.errors[index];
        entry.timestamp = error.timestamp;
        debug!(
            book,
            chapter,
            content = content.as_str(),
            error_type = error.error_type.as_str(),
            "Recording acquisition error"
        );
        match content {
            ArtifactKind::Audio => entry.audio_errors.push(error),
            ArtifactKind::Text => entry.text_errors.push(error),
            ArtifactKind::Timing => entry.timing_errors.push(error),
        }

        self.save()
    }

    pub fn summary(&self) -> ErrorSummary {
        self.document
            .errors
            .iter()
            .fold(ErrorSummary::default(), |mut summary, entry| {
                if entry.has_errors() {
                    summary.total_chapters_with_errors += 1;
                }
                summary.audio_errors += entry.audio_errors.len();
                summary.text_errors += entry.text_errors.len();
                summary.timing_errors += entry.timing_errors.len();
                summary
            })
    }

    fn save(&mut self) -> Result<(), LedgerError> {
        self.document.last_updated = Some(Utc::now());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| LedgerError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut bytes = serde_json::to_vec_pretty(&self.document)?;
        bytes.push(b'\n');
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).map_err(|source| LedgerError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| LedgerError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileset_id::FilesetId;
    use tempfile::TempDir;

    fn not_available(fileset: &str) -> FormatError {
        FormatError::new(AcquisitionErrorKind::NotAvailable)
            .with_fileset(&FilesetId::new(fileset))
            .with_distinct_id("ENGWEB")
    }

    #[test]
    fn test_record_groups_by_chapter() {
        let dir = TempDir::new().unwrap();
        let mut ledger = ErrorLedger::open(dir.path(), "eng").unwrap();

        ledger
            .record("MAT", 1, ArtifactKind::Audio, not_available("ENGWEBN1DA"))
            .unwrap();
        ledger
            .record("MAT", 1, ArtifactKind::Text, not_available("ENGWEBN_ET"))
            .unwrap();
        ledger
            .record("MAT", 2, ArtifactKind::Timing, not_available("ENGWEBN1DA"))
            .unwrap();

        assert_eq!(ledger.entries().len(), 2);
        assert_eq!(ledger.entries()[0].audio_errors.len(), 1);
        assert_eq!(ledger.entries()[0].text_errors.len(), 1);

        let summary = ledger.summary();
        assert_eq!(summary.total_chapters_with_errors, 2);
        assert_eq!(summary.audio_errors, 1);
        assert_eq!(summary.text_errors, 1);
        assert_eq!(summary.timing_errors, 1);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_saved_after_each_record_and_reopened() {
        let dir = TempDir::new().unwrap();
        let mut ledger = ErrorLedger::open(dir.path(), "eng").unwrap();
        ledger
            .record(
                "GEN",
                3,
                ArtifactKind::Audio,
                FormatError::new(AcquisitionErrorKind::TransportFailure)
                    .with_format("audio_drama")
                    .with_details("timed out"),
            )
            .unwrap();

        let path = dir.path().join("eng_errors.json");
        assert!(path.is_file());

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["language"], "eng");
        assert!(raw["last_updated"].is_string());
        let error = &raw["errors"][0]["audio_errors"][0];
        assert_eq!(error["error_type"], "transport_failure");
        assert_eq!(error["format"], "audio_drama");
        assert!(error.get("fileset").is_none());

        let mut reopened = ErrorLedger::open(dir.path(), "eng").unwrap();
        reopened
            .record("GEN", 3, ArtifactKind::Audio, not_available("ENGWEBO1DA"))
            .unwrap();
        assert_eq!(reopened.entries().len(), 1);
        assert_eq!(reopened.entries()[0].audio_errors.len(), 2);
    }

    #[test]
    fn test_empty_ledger_summary() {
        let dir = TempDir::new().unwrap();
        let ledger = ErrorLedger::open(dir.path(), "spa").unwrap();
        assert_eq!(ledger.summary(), ErrorSummary::default());
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_malformed_ledger_is_moved_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eng_errors.json");
        std::fs::write(&path, "not json").unwrap();

        let mut ledger = ErrorLedger::open(dir.path(), "eng").unwrap();
        assert!(ledger.entries().is_empty());
        assert_eq!(ledger.summary(), ErrorSummary::default());

        let backup = dir.path().join("eng_errors.json.bad");
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "not json");
        assert!(!path.exists());

        ledger
            .record("MAT", 1, ArtifactKind::Text, not_available("ENGWEBN_ET"))
            .unwrap();
        let reopened = ErrorLedger::open(dir.path(), "eng").unwrap();
        assert_eq!(reopened.entries().len(), 1);
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "not json");
    }
}
