//! The 66-book canon and book-spec parsing.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Old Testament books in canonical order with their chapter counts.
pub const OT_BOOKS: [(&str, u32); 39] = [
    ("GEN", 50),
    ("EXO", 40),
    ("LEV", 27),
    ("NUM", 36),
    ("DEU", 34),
    ("JOS", 24),
    ("JDG", 21),
    ("RUT", 4),
    ("1SA", 31),
    ("2SA", 24),
    ("1KI", 22),
    ("2KI", 25),
    ("1CH", 29),
    ("2CH", 36),
    ("EZR", 10),
    ("NEH", 13),
    ("EST", 10),
    ("JOB", 42),
    ("PSA", 150),
    ("PRO", 31),
    ("ECC", 12),
    ("SNG", 8),
    ("ISA", 66),
    ("JER", 52),
    ("LAM", 5),
    ("EZK", 48),
    ("DAN", 12),
    ("HOS", 14),
    ("JOL", 3),
    ("AMO", 9),
    ("OBA", 1),
    ("JON", 4),
    ("MIC", 7),
    ("NAM", 3),
    ("HAB", 3),
    ("ZEP", 3),
    ("HAG", 2),
    ("ZEC", 14),
    ("MAL", 4),
];

/// New Testament books in canonical order with their chapter counts.
pub const NT_BOOKS: [(&str, u32); 27] = [
    ("MAT", 28),
    ("MRK", 16),
    ("LUK", 24),
    ("JHN", 21),
    ("ACT", 28),
    ("ROM", 16),
    ("1CO", 16),
    ("2CO", 13),
    ("GAL", 6),
    ("EPH", 6),
    ("PHP", 4),
    ("COL", 4),
    ("1TH", 5),
    ("2TH", 3),
    ("1TI", 6),
    ("2TI", 4),
    ("TIT", 3),
    ("PHM", 1),
    ("HEB", 13),
    ("JAS", 5),
    ("1PE", 5),
    ("2PE", 3),
    ("1JN", 5),
    ("2JN", 1),
    ("3JN", 1),
    ("JUD", 1),
    ("REV", 22),
];

static CHAPTER_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)(?:-(\d+))?$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Testament {
    Old,
    New,
}

impl Testament {
    /// Which testament a book code belongs to, if it is a canonical book.
    pub fn of(book: &str) -> Option<Self> {
        if OT_BOOKS.iter().any(|(code, _)| *code == book) {
            Some(Self::Old)
        } else if NT_BOOKS.iter().any(|(code, _)| *code == book) {
            Some(Self::New)
        } else {
            None
        }
    }

    /// Book codes of this testament in canonical order.
    pub fn books(self) -> impl Iterator<Item = &'static str> {
        let table: &'static [(&'static str, u32)] = match self {
            Self::Old => &OT_BOOKS,
            Self::New => &NT_BOOKS,
        };
        table.iter().map(|(code, _)| *code)
    }
}

/// All 66 book codes in canonical order.
pub fn all_books() -> impl Iterator<Item = &'static str> {
    OT_BOOKS.iter().chain(NT_BOOKS.iter()).map(|(code, _)| *code)
}

pub fn chapter_count(book: &str) -> Option<u32> {
    OT_BOOKS
        .iter()
        .chain(NT_BOOKS.iter())
        .find(|(code, _)| *code == book)
        .map(|(_, count)| *count)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonError {
    #[error("Unknown book code: {0}")]
    UnknownBook(String),

    #[error("Invalid chapter {chapter} for {book} (max: {max})")]
    ChapterOutOfRange { book: String, chapter: u32, max: u32 },

    #[error("Invalid chapter specification '{0}'")]
    InvalidChapterSpec(String),

    #[error("Book specification is empty")]
    Empty,
}

/// A single book with the chapters to acquire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRequest {
    pub book: String,
    /// Sorted, deduplicated chapter numbers.
    pub chapters: Vec<u32>,
}

impl BookRequest {
    /// Request every chapter of a canonical book.
    pub fn whole(book: &str) -> Result<Self, CanonError> {
        let max = chapter_count(book).ok_or_else(|| CanonError::UnknownBook(book.to_string()))?;
        Ok(Self {
            book: book.to_string(),
            chapters: (1..=max).collect(),
        })
    }
}

impl fmt::Display for BookRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} chapters)", self.book, self.chapters.len())
    }
}

/// Replace tokens naming a story set with that set's book spec.
pub fn expand_story_sets(spec: &str, story_sets: &BTreeMap<String, String>) -> String {
    spec.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match story_sets.get(token) {
            Some(expansion) => expansion.as_str(),
            None => token,
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a book spec such as `GEN,EXO`, `GEN:1-5` or `MAT:1,3,5-7`.
///
/// A token that is only chapter numbers continues the previous book's
/// chapter list. Books keep their first-mention order; repeated mentions
/// merge their chapters.
pub fn parse_book_specs(spec: &str) -> Result<Vec<BookRequest>, CanonError> {
    let mut order: Vec<String> = Vec::new();
    let mut chapters: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
    let mut current: Option<String> = None;

    for raw in spec.split(',') {
        let token = raw.trim().to_uppercase();
        if token.is_empty() {
            continue;
        }

        let (book, chapter_spec) = match token.split_once(':') {
            Some((book, chapter_spec)) => (book.trim().to_string(), Some(chapter_spec.trim())),
            None if CHAPTER_TOKEN.is_match(&token) => match &current {
                Some(book) => (book.clone(), Some(token.as_str())),
                None => return Err(CanonError::InvalidChapterSpec(token.clone())),
            },
            None => (token.clone(), None),
        };

        let max = chapter_count(&book).ok_or_else(|| CanonError::UnknownBook(book.clone()))?;
        if !chapters.contains_key(&book) {
            order.push(book.clone());
        }
        let entry = chapters.entry(book.clone()).or_default();

        match chapter_spec {
            Some(chapter_spec) => entry.extend(parse_chapter_range(chapter_spec, &book, max)?),
            None => entry.extend(1..=max),
        }

        current = Some(book);
    }

    if order.is_empty() {
        return Err(CanonError::Empty);
    }

    Ok(order
        .into_iter()
        .map(|book| {
            let chapters = chapters.remove(&book).unwrap_or_default().into_iter().collect();
            BookRequest { book, chapters }
        })
        .collect())
}

/// Parse `N` or `N-M`, checked against `1..=max` before anything is expanded.
fn parse_chapter_range(
    token: &str,
    book: &str,
    max: u32,
) -> Result<RangeInclusive<u32>, CanonError> {
    let caps = CHAPTER_TOKEN
        .captures(token)
        .ok_or_else(|| CanonError::InvalidChapterSpec(token.to_string()))?;
    let parse = |s: &str| {
        s.parse::<u32>()
            .map_err(|_| CanonError::InvalidChapterSpec(token.to_string()))
    };

    let start = parse(caps.get(1).map_or("", |m| m.as_str()))?;
    let end = match caps.get(2) {
        Some(end) => parse(end.as_str())?,
        None => start,
    };
    if end < start {
        return Err(CanonError::InvalidChapterSpec(token.to_string()));
    }

    let out_of_range = |chapter| CanonError::ChapterOutOfRange {
        book: book.to_string(),
        chapter,
        max,
    };
    if start < 1 {
        return Err(out_of_range(start));
    }
    if end > max {
        return Err(out_of_range(end));
    }
    Ok(start..=end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canon_sizes() {
        assert_eq!(all_books().count(), 66);
        assert_eq!(Testament::Old.books().count(), 39);
        assert_eq!(Testament::New.books().count(), 27);
        assert_eq!(all_books().next(), Some("GEN"));
        assert_eq!(all_books().last(), Some("REV"));
    }

    #[test]
    fn test_testament_of() {
        assert_eq!(Testament::of("GEN"), Some(Testament::Old));
        assert_eq!(Testament::of("MAL"), Some(Testament::Old));
        assert_eq!(Testament::of("MAT"), Some(Testament::New));
        assert_eq!(Testament::of("REV"), Some(Testament::New));
        assert_eq!(Testament::of("XYZ"), None);
    }

    #[test]
    fn test_chapter_count() {
        assert_eq!(chapter_count("PSA"), Some(150));
        assert_eq!(chapter_count("JUD"), Some(1));
        assert_eq!(chapter_count("ABC"), None);
    }

    #[test]
    fn test_parse_whole_books() {
        let requests = parse_book_specs("gen, mat").unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].book, "GEN");
        assert_eq!(requests[0].chapters.len(), 50);
        assert_eq!(requests[1].book, "MAT");
        assert_eq!(requests[1].chapters, (1..=28).collect::<Vec<_>>());
    }

    #[test]
    fn test_parse_chapter_range() {
        let requests = parse_book_specs("GEN:1-5").unwrap();
        assert_eq!(requests[0].chapters, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_parse_chapter_list_continues_previous_book() {
        let requests = parse_book_specs("MAT:1,3,5-7").unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].chapters, vec![1, 3, 5, 6, 7]);
    }

    #[test]
    fn test_parse_merges_repeated_books() {
        let requests = parse_book_specs("JHN:3,GEN:1,JHN:1").unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].book, "JHN");
        assert_eq!(requests[0].chapters, vec![1, 3]);
        assert_eq!(requests[1].book, "GEN");
    }

    #[test]
    fn test_parse_rejects_unknown_book() {
        assert_eq!(
            parse_book_specs("GEN,XYZ"),
            Err(CanonError::UnknownBook("XYZ".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_out_of_range_chapter() {
        let err = parse_book_specs("JUD:2").unwrap_err();
        assert!(matches!(err, CanonError::ChapterOutOfRange { chapter: 2, max: 1, .. }));
        assert!(parse_book_specs("GEN:0").is_err());
    }

    #[test]
    fn test_parse_rejects_huge_range_without_expanding() {
        let err = parse_book_specs("JUD:1-300000000").unwrap_err();
        assert_eq!(
            err,
            CanonError::ChapterOutOfRange {
                book: "JUD".to_string(),
                chapter: 300_000_000,
                max: 1,
            }
        );
        assert!(matches!(
            parse_book_specs("PSA:140-4294967295"),
            Err(CanonError::ChapterOutOfRange { chapter: 4_294_967_295, max: 150, .. })
        ));
        assert_eq!(parse_book_specs("PSA:149-150").unwrap()[0].chapters, vec![149, 150]);
    }

    #[test]
    fn test_parse_rejects_bad_chapter_tokens() {
        assert!(matches!(
            parse_book_specs("GEN:5-1"),
            Err(CanonError::InvalidChapterSpec(_))
        ));
        assert!(matches!(
            parse_book_specs("GEN:a"),
            Err(CanonError::InvalidChapterSpec(_))
        ));
        assert!(matches!(
            parse_book_specs("3"),
            Err(CanonError::InvalidChapterSpec(_))
        ));
        assert_eq!(parse_book_specs(" , "), Err(CanonError::Empty));
    }

    #[test]
    fn test_expand_story_sets() {
        let mut sets = BTreeMap::new();
        sets.insert("CREATION".to_string(), "GEN:1-2".to_string());
        sets.insert("NATIVITY".to_string(), "MAT:1-2,LUK:2".to_string());

        let expanded = expand_story_sets("CREATION,NATIVITY,REV", &sets);
        assert_eq!(expanded, "GEN:1-2,MAT:1-2,LUK:2,REV");

        let requests = parse_book_specs(&expanded).unwrap();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].chapters, vec![1, 2]);
        assert_eq!(requests[2].book, "LUK");
        assert_eq!(requests[2].chapters, vec![2]);
    }

    #[test]
    fn test_book_request_whole() {
        let request = BookRequest::whole("RUT").unwrap();
        assert_eq!(request.chapters, vec![1, 2, 3, 4]);
        assert!(BookRequest::whole("ZZZ").is_err());
    }
}
