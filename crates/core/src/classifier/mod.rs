//! Fileset classification.
//!
//! Turns raw catalog entries into one [`ClassifiedMetadata`] record per
//! (language, fileset), discovers syncable audio/text pairs, and collects
//! exclusion facts into an [`ExclusionLedger`] owned by the run.
//!
//! Malformed input never aborts a run: entries without a language code and
//! filesets without an identifier are skipped and counted.

mod book_set;
mod exclusions;
mod registry;
mod types;

pub use book_set::{determine_book_set, BookSet};
pub use exclusions::{
    detect_exclusions, ExclusionCategory, ExclusionDocument, ExclusionLedger, ExclusionRecord,
    ExclusionSet, ExclusionSummary,
};
pub use registry::{FilesetRegistry, LanguageBucket, LanguageIndex, RegisteredFileset};
pub use types::*;

use tracing::{debug, info};

use crate::catalog::{CatalogEntry, ContentKind, TimingIndex};
use crate::matcher::{compute_syncable_pairs, SyncablePair};
use crate::metrics;

/// Classifies catalog entries against a timing-capability list.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    timing: TimingIndex,
}

impl Classifier {
    pub fn new(timing: TimingIndex) -> Self {
        Self { timing }
    }

    pub fn timing(&self) -> &TimingIndex {
        &self.timing
    }

    /// Classify a whole catalog snapshot.
    pub fn classify(&self, entries: &[CatalogEntry]) -> ClassificationOutput {
        let index = LanguageIndex::build(entries);
        info!(
            languages = index.len(),
            skipped_entries = index.skipped_entries,
            skipped_filesets = index.skipped_filesets,
            duplicates = index.duplicate_filesets,
            "Organized catalog by language"
        );

        let mut exclusions = ExclusionLedger::default();
        let languages: Vec<_> = index
            .into_buckets()
            .map(|bucket| self.classify_language(&bucket, &mut exclusions))
            .collect();

        let output = ClassificationOutput {
            languages,
            exclusions,
            timing_filesets_available: self.timing.len(),
        };
        info!(
            "Classified {} filesets across {} languages ({} excluded)",
            output.record_count(),
            output.languages.len(),
            output.exclusions.len()
        );
        output
    }

    /// Classify one language's registered filesets.
    ///
    /// Exclusions discovered along the way are appended to `exclusions`.
    pub fn classify_language(
        &self,
        bucket: &LanguageBucket,
        exclusions: &mut ExclusionLedger,
    ) -> LanguageClassification {
        let audio = bucket.filesets.ids_of(ContentKind::Audio);
        let text = bucket.filesets.ids_of(ContentKind::Text);
        let syncable_pairs = compute_syncable_pairs(&audio, &text, &self.timing);

        let records: Vec<_> = bucket
            .filesets
            .iter()
            .map(|registered| {
                let record = self.build_record(&bucket.language, registered, &syncable_pairs);
                track_exclusions(&bucket.language, registered, exclusions);
                metrics::FILESETS_CLASSIFIED
                    .with_label_values(&[registered.kind.as_str()])
                    .inc();
                record
            })
            .collect();

        debug!(
            iso = %bucket.language.iso,
            filesets = records.len(),
            pairs = syncable_pairs.len(),
            "Classified language"
        );

        LanguageClassification {
            language: bucket.language.clone(),
            records,
            syncable_pairs,
        }
    }

    fn build_record(
        &self,
        language: &LanguageRecord,
        registered: &RegisteredFileset,
        syncable_pairs: &[SyncablePair],
    ) -> ClassifiedMetadata {
        let id = &registered.id;
        let is_audio = registered.kind == ContentKind::Audio;
        let is_text = registered.kind == ContentKind::Text;
        let has_timing = is_audio && self.timing.has_timing(id);

        let audio_text_pairs: Vec<SyncablePair> = if is_audio {
            syncable_pairs
                .iter()
                .filter(|pair| &pair.audio_fileset_id == id)
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        let syncable = !audio_text_pairs.is_empty();

        let data_source = if is_audio {
            if has_timing {
                Some(DataSource::Timing)
            } else if syncable {
                Some(DataSource::Sync)
            } else {
                None
            }
        } else if is_text
            && syncable_pairs
                .iter()
                .any(|pair| pair.text_fileset_id.contains(id))
        {
            Some(DataSource::Sync)
        } else {
            None
        };

        let fileset = &registered.fileset;
        ClassifiedMetadata {
            language: language.clone(),
            bible: registered.work.clone(),
            fileset: FilesetInfo {
                id: id.clone(),
                kind: fileset.declared_type().to_string(),
                size: fileset.size_code().to_string(),
                volume: fileset.volume.clone().unwrap_or_default(),
                date: registered
                    .work_date
                    .clone()
                    .filter(|d| !d.is_empty())
                    .or_else(|| fileset.date.clone())
                    .unwrap_or_default(),
                collection: id.collection_char().map(String::from),
            },
            categorization: Categorization {
                has_text: is_text,
                has_audio: is_audio,
                has_timing,
                data_source,
                book_set: registered.book_set,
                syncable,
                audio_text_pairs,
            },
            download_ready: DownloadReady {
                text_fileset: is_text.then(|| id.clone()),
                audio_fileset: is_audio.then(|| id.clone()),
                timing_available: has_timing,
            },
        }
    }
}

fn track_exclusions(
    language: &LanguageRecord,
    registered: &RegisteredFileset,
    exclusions: &mut ExclusionLedger,
) {
    for category in detect_exclusions(
        &registered.id,
        registered.fileset.declared_type(),
        registered.book_set,
    ) {
        exclusions.record(
            category,
            ExclusionRecord {
                iso: language.iso.clone(),
                language: language.name.clone(),
                bible_abbr: registered.work.abbr.clone(),
                bible_name: registered.work.name.clone(),
                fileset_id: registered.id.clone(),
                fileset_type: registered.fileset.declared_type().to_string(),
                size: registered.fileset.size_code().to_string(),
                book_set: Some(registered.book_set),
                reason: String::new(),
            },
        );
    }
}
