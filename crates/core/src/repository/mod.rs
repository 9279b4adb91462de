//! Metadata repository - durable store of classified metadata.
//!
//! Records are addressed by (language, fileset id). Alongside them the
//! repository keeps the exclusion document and the cross-language summary.

mod fs;
mod types;

pub use fs::FsMetadataRepository;
pub use types::{LanguageCategory, LanguageMetadata};

use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::classifier::{
    ClassificationOutput, ClassificationSummary, ClassifiedMetadata, ExclusionDocument,
    ExclusionSet,
};

/// Storage for classification results.
pub trait MetadataRepository: Send + Sync {
    /// Persist one record. Returns `true` if the stored bytes changed.
    fn store(&self, record: &ClassifiedMetadata) -> Result<bool, RepositoryError>;

    /// All records for a language, including regional variants of its code.
    fn load_language(&self, iso: &str) -> Result<LanguageMetadata, RepositoryError>;

    /// Whether a language (or a regional variant of it) has been classified.
    fn language_exists(&self, iso: &str) -> Result<bool, RepositoryError>;

    /// Base three-letter codes of every stored language, sorted.
    fn list_languages(&self) -> Result<Vec<String>, RepositoryError>;

    fn store_exclusions(&self, document: &ExclusionDocument) -> Result<(), RepositoryError>;

    /// Exclusions from the last classification run; empty if none stored.
    fn load_exclusions(&self) -> Result<ExclusionSet, RepositoryError>;

    fn store_summary(&self, summary: &ClassificationSummary) -> Result<(), RepositoryError>;

    fn load_summary(&self) -> Result<Option<ClassificationSummary>, RepositoryError>;

    /// Languages falling into a batch-selection category, sorted.
    fn languages_by_category(
        &self,
        category: LanguageCategory,
    ) -> Result<Vec<String>, RepositoryError> {
        let mut matching = Vec::new();
        for iso in self.list_languages()? {
            if self.load_language(&iso)?.matches(category) {
                matching.push(iso);
            }
        }
        Ok(matching)
    }
}

/// Errors from the metadata repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Metadata directory not found: {0} (run `versekit classify` first)")]
    MissingRoot(PathBuf),

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {path}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Counts from persisting a classification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub records_written: usize,
    pub records_unchanged: usize,
    pub exclusions: usize,
}

/// Store every record, the exclusion document and the summary.
pub fn persist_classification(
    repository: &dyn MetadataRepository,
    output: &ClassificationOutput,
    catalog_fingerprint: &str,
) -> Result<PersistReport, RepositoryError> {
    let mut report = PersistReport::default();

    for language in &output.languages {
        for record in &language.records {
            if repository.store(record)? {
                report.records_written += 1;
            } else {
                report.records_unchanged += 1;
            }
        }
    }

    repository.store_exclusions(&ExclusionDocument::new(output.exclusions.clone()))?;
    report.exclusions = output.exclusions.len();

    repository.store_summary(&output.summary(catalog_fingerprint))?;

    info!(
        written = report.records_written,
        unchanged = report.records_unchanged,
        exclusions = report.exclusions,
        "Persisted classification"
    );
    Ok(report)
}
