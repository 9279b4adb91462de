//! Candidate selection and priority.
//!
//! A fileset is a candidate for a book when it carries the content type, its
//! book-set scope covers the book, and it is in no exclusion category.

use crate::classifier::{ClassifiedMetadata, ExclusionSet};
use crate::repository::LanguageMetadata;

fn eligible(record: &ClassifiedMetadata, exclusions: &ExclusionSet, book: &str) -> bool {
    record.covers(book) && !exclusions.is_excluded(record.id())
}

/// Audio candidates for `book`, best first.
///
/// Non-dramatized before dramatized, plain before compressed within each,
/// then by identifier.
pub fn audio_candidates<'a>(
    metadata: &'a LanguageMetadata,
    exclusions: &ExclusionSet,
    book: &str,
) -> Vec<&'a ClassifiedMetadata> {
    let mut candidates =
        metadata.filter(|r| r.categorization.has_audio && eligible(r, exclusions, book));
    candidates.sort_by_key(|r| (r.id().is_dramatized(), r.id().audio_format(), r.id().clone()));
    candidates
}

/// Text candidates for `book`, best first: plain, markup, JSON.
pub fn text_candidates<'a>(
    metadata: &'a LanguageMetadata,
    exclusions: &ExclusionSet,
    book: &str,
) -> Vec<&'a ClassifiedMetadata> {
    let mut candidates =
        metadata.filter(|r| r.categorization.has_text && eligible(r, exclusions, book));
    candidates.sort_by_key(|r| (r.id().text_format(), r.id().clone()));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{BookSet, ExclusionCategory, ExclusionLedger, ExclusionRecord};
    use crate::fileset_id::FilesetId;
    use crate::testing::fixtures::metadata_record;

    fn language(records: Vec<ClassifiedMetadata>) -> LanguageMetadata {
        let mut metadata = LanguageMetadata::new("eng");
        for record in records {
            metadata.insert(record);
        }
        metadata
    }

    fn ids(records: &[&ClassifiedMetadata]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn test_audio_priority_order() {
        let metadata = language(vec![
            metadata_record("eng", "ENGWEB", "ENGWEBN2DA-opus16", "audio_drama", BookSet::Nt),
            metadata_record("eng", "ENGWEB", "ENGWEBN2DA", "audio_drama", BookSet::Nt),
            metadata_record("eng", "ENGWEB", "ENGWEBN1DA-opus16", "audio", BookSet::Nt),
            metadata_record("eng", "ENGWEB", "ENGWEBN1DA", "audio", BookSet::Nt),
        ]);
        let candidates = audio_candidates(&metadata, &ExclusionSet::default(), "MAT");
        assert_eq!(
            ids(&candidates),
            vec!["ENGWEBN1DA", "ENGWEBN1DA-opus16", "ENGWEBN2DA", "ENGWEBN2DA-opus16"]
        );
    }

    #[test]
    fn test_text_priority_order() {
        let metadata = language(vec![
            metadata_record("eng", "ENGWEB", "ENGWEBN_ET-json", "text_json", BookSet::Nt),
            metadata_record("eng", "ENGWEB", "ENGWEBN_ET-usx", "text_usx", BookSet::Nt),
            metadata_record("eng", "ENGWEB", "ENGWEBN_ET", "text_plain", BookSet::Nt),
        ]);
        let candidates = text_candidates(&metadata, &ExclusionSet::default(), "JHN");
        assert_eq!(
            ids(&candidates),
            vec!["ENGWEBN_ET", "ENGWEBN_ET-usx", "ENGWEBN_ET-json"]
        );
    }

    #[test]
    fn test_scope_filters_books() {
        let metadata = language(vec![
            metadata_record("eng", "ENGWEB", "ENGWEBN1DA", "audio", BookSet::Nt),
            metadata_record("eng", "ENGWEB", "ENGWEBC1DA", "audio", BookSet::Full),
            metadata_record("eng", "ENGWEB", "ENGWEBP1DA", "audio", BookSet::Partial),
        ]);
        let candidates = audio_candidates(&metadata, &ExclusionSet::default(), "GEN");
        assert_eq!(ids(&candidates), vec!["ENGWEBC1DA"]);

        let candidates = audio_candidates(&metadata, &ExclusionSet::default(), "MAT");
        assert_eq!(ids(&candidates), vec!["ENGWEBC1DA", "ENGWEBN1DA"]);
    }

    #[test]
    fn test_excluded_filesets_are_skipped() {
        let metadata = language(vec![
            metadata_record("eng", "ENGWEB", "ENGWEBN1DA", "audio", BookSet::Nt),
            metadata_record("eng", "ENGWEB", "ENGWEBN2SA", "audio_drama", BookSet::Nt),
        ]);
        let mut ledger = ExclusionLedger::default();
        ledger.record(
            ExclusionCategory::SaVersions,
            ExclusionRecord {
                iso: "eng".to_string(),
                language: "English".to_string(),
                bible_abbr: "ENGWEB".to_string(),
                bible_name: "World English Bible".to_string(),
                fileset_id: FilesetId::new("ENGWEBN2SA"),
                fileset_type: "audio_drama".to_string(),
                size: "NT".to_string(),
                book_set: None,
                reason: String::new(),
            },
        );
        let exclusions = ExclusionSet::from_ledger(&ledger);

        let candidates = audio_candidates(&metadata, &exclusions, "MAT");
        assert_eq!(ids(&candidates), vec!["ENGWEBN1DA"]);
    }
}
