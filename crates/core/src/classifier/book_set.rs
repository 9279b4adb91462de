//! Book-set scope resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canon::Testament;
use crate::fileset_id::{CollectionMarker, FilesetId};

/// Which portion of the canon a fileset covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookSet {
    Full,
    Ot,
    Nt,
    Partial,
    Story,
    Various,
}

impl BookSet {
    /// Whether a fileset of this scope can serve `book`.
    ///
    /// PARTIAL, STORY and VARIOUS never cover anything: their book lists are
    /// unknown without querying the content API.
    pub fn covers(self, book: &str) -> bool {
        match self {
            Self::Full => Testament::of(book).is_some(),
            Self::Ot => Testament::of(book) == Some(Testament::Old),
            Self::Nt => Testament::of(book) == Some(Testament::New),
            Self::Partial | Self::Story | Self::Various => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Ot => "OT",
            Self::Nt => "NT",
            Self::Partial => "PARTIAL",
            Self::Story => "STORY",
            Self::Various => "VARIOUS",
        }
    }
}

impl fmt::Display for BookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a fileset's scope from its identifier marker and declared size.
///
/// The identifier marker is read first; the size code then refines it:
/// `C`/`NTOTP` force FULL, `NT`/`NTP` force NT unless already OT or FULL,
/// `OT`/`OTP` force OT unless already NT or FULL. A PARTIAL marker is never
/// overridden.
pub fn determine_book_set(id: &FilesetId, size: &str) -> BookSet {
    let from_marker = id.testament_marker().map(|marker| match marker {
        CollectionMarker::OldTestament => BookSet::Ot,
        CollectionMarker::NewTestament => BookSet::Nt,
        CollectionMarker::Complete => BookSet::Full,
        CollectionMarker::Partial => BookSet::Partial,
        CollectionMarker::Story => BookSet::Story,
    });

    let resolved = match (from_marker, size) {
        (Some(BookSet::Partial), _) => Some(BookSet::Partial),
        (_, "C" | "NTOTP") => Some(BookSet::Full),
        (Some(current @ (BookSet::Ot | BookSet::Full)), "NT" | "NTP") => Some(current),
        (_, "NT" | "NTP") => Some(BookSet::Nt),
        (Some(current @ (BookSet::Nt | BookSet::Full)), "OT" | "OTP") => Some(current),
        (_, "OT" | "OTP") => Some(BookSet::Ot),
        (current, _) => current,
    };

    resolved.unwrap_or(BookSet::Various)
}
