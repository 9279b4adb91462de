//! Exclusion tracking.
//!
//! Exclusions are facts discovered during classification. They never remove a
//! record from the metadata repository; they only keep a fileset out of
//! acquisition candidate lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::book_set::BookSet;
use crate::fileset_id::FilesetId;
use crate::metrics;

/// Why a fileset is kept out of acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionCategory {
    /// Streaming-only adaptation (`SA` content-type tag).
    SaVersions,
    /// Identifier marks an incomplete book set.
    PartialContent,
    /// Video or story adaptation.
    StoryAdaptations,
}

impl ExclusionCategory {
    pub const ALL: [ExclusionCategory; 3] = [
        Self::SaVersions,
        Self::PartialContent,
        Self::StoryAdaptations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaVersions => "sa_versions",
            Self::PartialContent => "partial_content",
            Self::StoryAdaptations => "story_adaptations",
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::SaVersions => "Streaming-only story adaptation (SA content type)",
            Self::PartialContent => "Partial content (collection P, incomplete book set)",
            Self::StoryAdaptations => "Video/story adaptation format",
        }
    }
}

/// Every category a fileset falls into. Categories are independent.
pub fn detect_exclusions(
    id: &FilesetId,
    declared_type: &str,
    book_set: BookSet,
) -> Vec<ExclusionCategory> {
    let mut categories = Vec::new();
    if id.is_streaming_adaptation() {
        categories.push(ExclusionCategory::SaVersions);
    }
    if book_set == BookSet::Partial {
        categories.push(ExclusionCategory::PartialContent);
    }
    let declared = declared_type.to_lowercase();
    if declared.contains("story") || declared.contains("video") {
        categories.push(ExclusionCategory::StoryAdaptations);
    }
    categories
}

/// Provenance for one excluded fileset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRecord {
    pub iso: String,
    pub language: String,
    pub bible_abbr: String,
    pub bible_name: String,
    pub fileset_id: FilesetId,
    #[serde(rename = "type")]
    pub fileset_type: String,
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_set: Option<BookSet>,
    pub reason: String,
}

/// Exclusion records grouped by category, accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionLedger {
    #[serde(default)]
    pub sa_versions: Vec<ExclusionRecord>,
    #[serde(default)]
    pub partial_content: Vec<ExclusionRecord>,
    #[serde(default)]
    pub story_adaptations: Vec<ExclusionRecord>,
}

impl ExclusionLedger {
    /// Append a record under `category`; the reason text is filled in here.
    pub fn record(&mut self, category: ExclusionCategory, mut record: ExclusionRecord) {
        record.reason = category.reason().to_string();
        if category != ExclusionCategory::PartialContent {
            record.book_set = None;
        }
        metrics::EXCLUSIONS_RECORDED
            .with_label_values(&[category.as_str()])
            .inc();
        self.category_mut(category).push(record);
    }

    pub fn category(&self, category: ExclusionCategory) -> &[ExclusionRecord] {
        match category {
            ExclusionCategory::SaVersions => &self.sa_versions,
            ExclusionCategory::PartialContent => &self.partial_content,
            ExclusionCategory::StoryAdaptations => &self.story_adaptations,
        }
    }

    fn category_mut(&mut self, category: ExclusionCategory) -> &mut Vec<ExclusionRecord> {
        match category {
            ExclusionCategory::SaVersions => &mut self.sa_versions,
            ExclusionCategory::PartialContent => &mut self.partial_content,
            ExclusionCategory::StoryAdaptations => &mut self.story_adaptations,
        }
    }

    pub fn len(&self) -> usize {
        self.sa_versions.len() + self.partial_content.len() + self.story_adaptations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> ExclusionSummary {
        ExclusionSummary {
            sa_versions: self.sa_versions.len(),
            partial_content: self.partial_content.len(),
            story_adaptations: self.story_adaptations.len(),
            total_excluded: self.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSummary {
    pub sa_versions: usize,
    pub partial_content: usize,
    pub story_adaptations: usize,
    pub total_excluded: usize,
}

/// The persisted exclusion document (`exclude_download.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionDocument {
    pub generated: DateTime<Utc>,
    pub summary: ExclusionSummary,
    pub exclusions: ExclusionLedger,
}

impl ExclusionDocument {
    pub fn new(exclusions: ExclusionLedger) -> Self {
        Self {
            generated: Utc::now(),
            summary: exclusions.summary(),
            exclusions,
        }
    }
}

/// Lookup view over an exclusion ledger, keyed by fileset identifier.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    streaming: HashSet<FilesetId>,
    partial: HashSet<FilesetId>,
    story: HashSet<FilesetId>,
}

impl ExclusionSet {
    pub fn from_ledger(ledger: &ExclusionLedger) -> Self {
        let ids = |records: &[ExclusionRecord]| {
            records
                .iter()
                .map(|r| r.fileset_id.clone())
                .collect::<HashSet<_>>()
        };
        Self {
            streaming: ids(&ledger.sa_versions),
            partial: ids(&ledger.partial_content),
            story: ids(&ledger.story_adaptations),
        }
    }

    pub fn contains(&self, category: ExclusionCategory, id: &FilesetId) -> bool {
        match category {
            ExclusionCategory::SaVersions => self.streaming.contains(id),
            ExclusionCategory::PartialContent => self.partial.contains(id),
            ExclusionCategory::StoryAdaptations => self.story.contains(id),
        }
    }

    /// Whether the fileset is in any exclusion category.
    pub fn is_excluded(&self, id: &FilesetId) -> bool {
        ExclusionCategory::ALL
            .iter()
            .any(|category| self.contains(*category, id))
    }

    pub fn len(&self) -> usize {
        self.streaming.len() + self.partial.len() + self.story.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ExclusionRecord {
        ExclusionRecord {
            iso: "eng".to_string(),
            language: "English".to_string(),
            bible_abbr: "ENGWEB".to_string(),
            bible_name: "World English Bible".to_string(),
            fileset_id: FilesetId::new(id),
            fileset_type: "audio_drama".to_string(),
            size: "NT".to_string(),
            book_set: Some(BookSet::Nt),
            reason: String::new(),
        }
    }

    #[test]
    fn test_detect_streaming_adaptation() {
        let found = detect_exclusions(&FilesetId::new("ENGWEBN2SA"), "audio_drama", BookSet::Nt);
        assert_eq!(found, vec![ExclusionCategory::SaVersions]);
    }

    #[test]
    fn test_detect_partial() {
        let found = detect_exclusions(&FilesetId::new("ENGWEBP1DA"), "audio", BookSet::Partial);
        assert_eq!(found, vec![ExclusionCategory::PartialContent]);
    }

    #[test]
    fn test_detect_story_case_insensitive() {
        let found = detect_exclusions(&FilesetId::new("ENGWEBN1DV"), "Video_Stream", BookSet::Nt);
        assert_eq!(found, vec![ExclusionCategory::StoryAdaptations]);
        let found = detect_exclusions(&FilesetId::new("ENGWEBN1DA"), "audio_story", BookSet::Nt);
        assert_eq!(found, vec![ExclusionCategory::StoryAdaptations]);
    }

    #[test]
    fn test_detect_multiple_categories() {
        let found = detect_exclusions(&FilesetId::new("ENGWEBP1SA"), "video", BookSet::Partial);
        assert_eq!(
            found,
            vec![
                ExclusionCategory::SaVersions,
                ExclusionCategory::PartialContent,
                ExclusionCategory::StoryAdaptations,
            ]
        );
    }

    #[test]
    fn test_detect_nothing() {
        assert!(detect_exclusions(&FilesetId::new("ENGWEBN1DA"), "audio", BookSet::Nt).is_empty());
    }

    #[test]
    fn test_ledger_record_and_summary() {
        let mut ledger = ExclusionLedger::default();
        ledger.record(ExclusionCategory::SaVersions, record("ENGWEBN2SA"));
        ledger.record(ExclusionCategory::PartialContent, record("ENGWEBP1DA"));

        let summary = ledger.summary();
        assert_eq!(summary.sa_versions, 1);
        assert_eq!(summary.partial_content, 1);
        assert_eq!(summary.story_adaptations, 0);
        assert_eq!(summary.total_excluded, 2);

        // Book set is kept only for partial-content provenance.
        assert_eq!(ledger.sa_versions[0].book_set, None);
        assert_eq!(ledger.partial_content[0].book_set, Some(BookSet::Nt));
        assert!(!ledger.sa_versions[0].reason.is_empty());
    }

    #[test]
    fn test_exclusion_set_lookup() {
        let mut ledger = ExclusionLedger::default();
        ledger.record(ExclusionCategory::StoryAdaptations, record("ENGWEBN1DV"));

        let set = ExclusionSet::from_ledger(&ledger);
        let id = FilesetId::new("ENGWEBN1DV");
        assert!(set.is_excluded(&id));
        assert!(set.contains(ExclusionCategory::StoryAdaptations, &id));
        assert!(!set.contains(ExclusionCategory::SaVersions, &id));
        assert!(!set.is_excluded(&FilesetId::new("ENGWEBN1DA")));
    }

    #[test]
    fn test_document_serialization_shape() {
        let mut ledger = ExclusionLedger::default();
        ledger.record(ExclusionCategory::SaVersions, record("ENGWEBN2SA"));
        let doc = ExclusionDocument::new(ledger);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["summary"]["total_excluded"], 1);
        assert_eq!(
            value["exclusions"]["sa_versions"][0]["fileset_id"],
            "ENGWEBN2SA"
        );
        assert_eq!(value["exclusions"]["sa_versions"][0]["type"], "audio_drama");
        assert!(value["exclusions"]["sa_versions"][0].get("book_set").is_none());
    }
}
