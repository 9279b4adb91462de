//! Per-language fileset registry.
//!
//! The same fileset identifier can appear under several catalog entries or
//! platforms. The first occurrence (catalog page order, then platform order)
//! is registered; later duplicates are ignored, never merged.

use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use super::book_set::{determine_book_set, BookSet};
use super::types::{LanguageRecord, WorkRef};
use crate::catalog::{CatalogEntry, ContentKind, Fileset};
use crate::fileset_id::FilesetId;

/// A fileset accepted into a language's registry, with its owning work.
#[derive(Debug, Clone)]
pub struct RegisteredFileset {
    pub id: FilesetId,
    pub fileset: Fileset,
    pub work: WorkRef,
    pub work_date: Option<String>,
    pub kind: ContentKind,
    pub book_set: BookSet,
}

#[derive(Debug, Default)]
pub struct FilesetRegistry {
    seen: HashSet<FilesetId>,
    filesets: Vec<RegisteredFileset>,
}

impl FilesetRegistry {
    /// Register a fileset. Returns `false` if the identifier was already seen.
    pub fn register(&mut self, fileset: RegisteredFileset) -> bool {
        if !self.seen.insert(fileset.id.clone()) {
            return false;
        }
        self.filesets.push(fileset);
        true
    }

    pub fn contains(&self, id: &FilesetId) -> bool {
        self.seen.contains(id)
    }

    /// Registered filesets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredFileset> {
        self.filesets.iter()
    }

    /// Identifiers of one content kind, in insertion order.
    pub fn ids_of(&self, kind: ContentKind) -> Vec<FilesetId> {
        self.filesets
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| f.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.filesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filesets.is_empty()
    }
}

/// One language's record and registered filesets.
#[derive(Debug)]
pub struct LanguageBucket {
    pub language: LanguageRecord,
    pub filesets: FilesetRegistry,
}

/// Catalog entries grouped by language code, ordered by code.
#[derive(Debug, Default)]
pub struct LanguageIndex {
    languages: BTreeMap<String, LanguageBucket>,
    pub skipped_entries: usize,
    pub skipped_filesets: usize,
    pub duplicate_filesets: usize,
}

impl LanguageIndex {
    pub fn build(entries: &[CatalogEntry]) -> Self {
        let mut index = Self::default();

        for entry in entries {
            let Some(iso) = entry.language_code() else {
                debug!(abbr = ?entry.abbr, "Skipping catalog entry without language code");
                index.skipped_entries += 1;
                continue;
            };

            let bucket = index
                .languages
                .entry(iso.to_string())
                .or_insert_with(|| LanguageBucket {
                    language: language_record(iso, entry),
                    filesets: FilesetRegistry::default(),
                });

            let work = WorkRef {
                abbr: entry.abbr.clone().unwrap_or_default(),
                name: entry.name.clone().unwrap_or_default(),
            };

            for fileset in entry.all_filesets() {
                let Some(id) = fileset.fileset_id() else {
                    index.skipped_filesets += 1;
                    continue;
                };
                let book_set = determine_book_set(&id, fileset.size_code());
                let registered = RegisteredFileset {
                    id,
                    fileset: fileset.clone(),
                    work: work.clone(),
                    work_date: entry.date.clone(),
                    kind: fileset.content_kind(),
                    book_set,
                };
                if !bucket.filesets.register(registered) {
                    index.duplicate_filesets += 1;
                }
            }
        }

        index
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub fn get(&self, iso: &str) -> Option<&LanguageBucket> {
        self.languages.get(iso)
    }

    pub fn into_buckets(self) -> impl Iterator<Item = LanguageBucket> {
        self.languages.into_values()
    }
}

fn language_record(iso: &str, entry: &CatalogEntry) -> LanguageRecord {
    let name = entry.language.clone().unwrap_or_default();
    let autonym = entry
        .autonym
        .clone()
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| name.clone());
    LanguageRecord {
        iso: iso.to_string(),
        language_id: entry.language_id,
        name,
        autonym,
    }
}
