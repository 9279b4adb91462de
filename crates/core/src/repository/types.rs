//! Repository query types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::canon::Testament;
use crate::classifier::{BookSet, ClassifiedMetadata, DataSource, LanguageRecord};
use crate::fileset_id::FilesetId;

/// All records stored for one language, keyed by fileset identifier.
#[derive(Debug, Clone, Default)]
pub struct LanguageMetadata {
    pub iso: String,
    records: BTreeMap<FilesetId, ClassifiedMetadata>,
}

impl LanguageMetadata {
    pub fn new(iso: impl Into<String>) -> Self {
        Self {
            iso: iso.into(),
            records: BTreeMap::new(),
        }
    }

    /// Insert a record; an existing record for the same fileset is kept.
    pub fn insert(&mut self, record: ClassifiedMetadata) {
        self.records.entry(record.id().clone()).or_insert(record);
    }

    pub fn get(&self, id: &FilesetId) -> Option<&ClassifiedMetadata> {
        self.records.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &ClassifiedMetadata> {
        self.records.values()
    }

    /// Records matching a predicate, in fileset-id order.
    pub fn filter<P>(&self, predicate: P) -> Vec<&ClassifiedMetadata>
    where
        P: Fn(&ClassifiedMetadata) -> bool,
    {
        self.records.values().filter(|r| predicate(r)).collect()
    }

    /// Language info from the first stored record.
    pub fn language_info(&self) -> Option<&LanguageRecord> {
        self.records.values().next().map(|r| &r.language)
    }

    /// Whether the fileset has published timing data.
    pub fn timing_available(&self, id: &FilesetId) -> bool {
        self.records
            .get(id)
            .map(|r| r.download_ready.timing_available)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any record spans each testament, as (old, new).
    fn testament_coverage<P>(&self, predicate: P) -> (bool, bool)
    where
        P: Fn(&ClassifiedMetadata) -> bool,
    {
        self.records
            .values()
            .filter(|r| predicate(r))
            .fold((false, false), |(ot, nt), r| {
                (ot || r.spans(Testament::Old), nt || r.spans(Testament::New))
            })
    }

    /// Whether the language falls into a batch-selection category.
    pub fn matches(&self, category: LanguageCategory) -> bool {
        if self.is_empty() {
            return false;
        }
        let sync = |r: &ClassifiedMetadata| {
            r.categorization.syncable && r.categorization.data_source == Some(DataSource::Sync)
        };
        let timing = |r: &ClassifiedMetadata| {
            r.categorization.has_timing
                && r.categorization.data_source == Some(DataSource::Timing)
        };

        match category {
            LanguageCategory::All => true,
            LanguageCategory::SyncFull => self.testament_coverage(sync) == (true, true),
            LanguageCategory::SyncNt => self.testament_coverage(sync).1,
            LanguageCategory::SyncOt => self.testament_coverage(sync).0,
            LanguageCategory::TimingFull => self.testament_coverage(timing) == (true, true),
            LanguageCategory::TimingNt => self.testament_coverage(timing).1,
            LanguageCategory::TimingOt => self.testament_coverage(timing).0,
        }
    }

    /// Books to acquire when none were requested, from overall coverage.
    ///
    /// FULL or OT+NT coverage yields the whole canon, a single testament
    /// yields that testament, anything else falls back to the whole canon.
    pub fn default_books(&self) -> Vec<&'static str> {
        let usable = |r: &ClassifiedMetadata| {
            matches!(
                r.book_set(),
                BookSet::Full | BookSet::Ot | BookSet::Nt
            )
        };
        match self.testament_coverage(usable) {
            (true, false) => Testament::Old.books().collect(),
            (false, true) => Testament::New.books().collect(),
            _ => crate::canon::all_books().collect(),
        }
    }
}

/// Batch-selection categories over a language's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageCategory {
    All,
    SyncFull,
    SyncNt,
    SyncOt,
    TimingFull,
    TimingNt,
    TimingOt,
}

impl LanguageCategory {
    pub const ALL_CATEGORIES: [LanguageCategory; 7] = [
        Self::All,
        Self::SyncFull,
        Self::SyncNt,
        Self::SyncOt,
        Self::TimingFull,
        Self::TimingNt,
        Self::TimingOt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::SyncFull => "SYNC_FULL",
            Self::SyncNt => "SYNC_NT",
            Self::SyncOt => "SYNC_OT",
            Self::TimingFull => "TIMING_FULL",
            Self::TimingNt => "TIMING_NT",
            Self::TimingOt => "TIMING_OT",
        }
    }
}

impl fmt::Display for LanguageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL_CATEGORIES
            .into_iter()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| {
                let valid: Vec<_> = Self::ALL_CATEGORIES.iter().map(|c| c.as_str()).collect();
                format!("unknown book-set category '{}' (valid: {})", s, valid.join(", "))
            })
    }
}
