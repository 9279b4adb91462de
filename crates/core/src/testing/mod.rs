//! Testing utilities and mock implementations.
//!
//! This module provides a mock of the content API, allowing catalog fetches
//! and acquisition runs to be tested without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use versekit_core::testing::{fixtures, MockContentClient};
//!
//! let client = MockContentClient::new();
//! client.add_text("ENGWEBN_ET", "MAT", 1, "In the beginning").await;
//!
//! let entry = fixtures::catalog_entry("ENGWEB", "eng", vec![
//!     fixtures::fileset("ENGWEBN_ET", "text_plain", "NT"),
//! ]);
//! ```

mod mock_content_client;

pub use mock_content_client::{ContentOperation, MockContentClient, RecordedContentCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{CatalogEntry, ContentKind, Fileset, Platforms};
    use crate::classifier::{
        BookSet, Categorization, ClassifiedMetadata, DownloadReady, FilesetInfo, LanguageRecord,
        WorkRef,
    };
    use crate::fileset_id::FilesetId;

    /// Create a catalog fileset with the given id, declared type and size.
    pub fn fileset(id: &str, kind: &str, size: &str) -> Fileset {
        Fileset {
            id: Some(id.to_string()),
            kind: Some(kind.to_string()),
            size: (!size.is_empty()).then(|| size.to_string()),
            ..Default::default()
        }
    }

    /// Create a catalog entry hosting `filesets` on a single platform.
    pub fn catalog_entry(abbr: &str, iso: &str, filesets: Vec<Fileset>) -> CatalogEntry {
        let mut platforms = Platforms::default();
        platforms.insert("dbp-prod", filesets);
        CatalogEntry {
            abbr: Some(abbr.to_string()),
            name: Some(format!("{} Bible", abbr)),
            iso: Some(iso.to_string()),
            language_id: None,
            language: Some(format!("Language {}", iso)),
            autonym: None,
            date: None,
            filesets: platforms,
        }
    }

    /// Create a classified record, with content flags derived from `kind`.
    pub fn metadata_record(
        iso: &str,
        abbr: &str,
        id: &str,
        kind: &str,
        book_set: BookSet,
    ) -> ClassifiedMetadata {
        let fileset_id = FilesetId::new(id);
        let content = ContentKind::from_declared_type(kind);
        let is_audio = content == ContentKind::Audio;
        let is_text = content == ContentKind::Text;

        ClassifiedMetadata {
            language: LanguageRecord {
                iso: iso.to_string(),
                language_id: None,
                name: format!("Language {}", iso),
                autonym: format!("Language {}", iso),
            },
            bible: WorkRef {
                abbr: abbr.to_string(),
                name: format!("{} Bible", abbr),
            },
            fileset: FilesetInfo {
                id: fileset_id.clone(),
                kind: kind.to_string(),
                size: book_set.as_str().to_string(),
                volume: String::new(),
                date: String::new(),
                collection: fileset_id.collection_char().map(String::from),
            },
            categorization: Categorization {
                has_text: is_text,
                has_audio: is_audio,
                has_timing: false,
                data_source: None,
                book_set,
                syncable: false,
                audio_text_pairs: Vec::new(),
            },
            download_ready: DownloadReady {
                text_fileset: is_text.then(|| fileset_id.clone()),
                audio_fileset: is_audio.then(|| fileset_id.clone()),
                timing_available: false,
            },
        }
    }
}
