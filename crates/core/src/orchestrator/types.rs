//! Types for the acquisition orchestrator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::ErrorSummary;

/// Errors that abort an acquisition run.
///
/// Individual fetch and write failures are never errors here; they go to
/// the language's error ledger.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No classified metadata for the language.
    #[error("language not found in metadata: {0}")]
    LanguageNotFound(String),

    /// Metadata repository error.
    #[error("metadata repository error: {0}")]
    Repository(#[from] crate::repository::RepositoryError),

    /// Error ledger could not be opened.
    #[error("error ledger error: {0}")]
    Ledger(#[from] crate::ledger::LedgerError),

    /// Invalid book request.
    #[error("invalid book request: {0}")]
    Canon(#[from] crate::canon::CanonError),

    /// The content API refused our credentials.
    #[error("content API rejected the configured credentials: {0}")]
    Unauthorized(crate::content_api::FetchError),
}

/// Results for one chapter, counted per content type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChapterOutcome {
    pub chapter: u32,
    pub audio_downloaded: usize,
    pub audio_existing: usize,
    pub text_downloaded: usize,
    pub text_existing: usize,
    pub timing_downloaded: usize,
    pub timing_existing: usize,
    /// Failures recorded to the error ledger.
    pub failures: usize,
}

impl ChapterOutcome {
    pub fn new(chapter: u32) -> Self {
        Self {
            chapter,
            ..Default::default()
        }
    }

    pub fn audio_successes(&self) -> usize {
        self.audio_downloaded + self.audio_existing
    }

    pub fn text_successes(&self) -> usize {
        self.text_downloaded + self.text_existing
    }

    pub fn timing_successes(&self) -> usize {
        self.timing_downloaded + self.timing_existing
    }
}

/// Results for one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookReport {
    pub book: String,
    pub audio_candidates: usize,
    pub text_candidates: usize,
    pub chapters: Vec<ChapterOutcome>,
}

impl BookReport {
    /// No fileset covers this book.
    pub fn nothing_to_do(&self) -> bool {
        self.audio_candidates == 0 && self.text_candidates == 0
    }

    pub fn audio_successes(&self) -> usize {
        self.chapters.iter().map(ChapterOutcome::audio_successes).sum()
    }

    pub fn text_successes(&self) -> usize {
        self.chapters.iter().map(ChapterOutcome::text_successes).sum()
    }

    pub fn timing_successes(&self) -> usize {
        self.chapters.iter().map(ChapterOutcome::timing_successes).sum()
    }

    pub fn failures(&self) -> usize {
        self.chapters.iter().map(|c| c.failures).sum()
    }
}

/// Results for one language run.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageReport {
    pub run_id: Uuid,
    pub language: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub books: Vec<BookReport>,
    /// Ledger totals after the run, including earlier runs.
    pub errors: ErrorSummary,
}

impl LanguageReport {
    pub fn audio_successes(&self) -> usize {
        self.books.iter().map(BookReport::audio_successes).sum()
    }

    pub fn text_successes(&self) -> usize {
        self.books.iter().map(BookReport::text_successes).sum()
    }

    pub fn timing_successes(&self) -> usize {
        self.books.iter().map(BookReport::timing_successes).sum()
    }

    pub fn failures(&self) -> usize {
        self.books.iter().map(BookReport::failures).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_report_totals() {
        let report = BookReport {
            book: "MAT".to_string(),
            audio_candidates: 2,
            text_candidates: 1,
            chapters: vec![
                ChapterOutcome {
                    audio_downloaded: 1,
                    timing_existing: 1,
                    ..ChapterOutcome::new(1)
                },
                ChapterOutcome {
                    audio_existing: 2,
                    text_downloaded: 1,
                    failures: 3,
                    ..ChapterOutcome::new(2)
                },
            ],
        };
        assert!(!report.nothing_to_do());
        assert_eq!(report.audio_successes(), 3);
        assert_eq!(report.text_successes(), 1);
        assert_eq!(report.timing_successes(), 1);
        assert_eq!(report.failures(), 3);
    }

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::LanguageNotFound("xyz".to_string());
        assert_eq!(err.to_string(), "language not found in metadata: xyz");
    }
}
